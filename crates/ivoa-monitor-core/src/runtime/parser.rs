// crates/ivoa-monitor-core/src/runtime/parser.rs
// ============================================================================
// Module: IVOA Monitor Validator Result Parser
// Description: Decoders for the document and JSON validator payloads.
// Purpose: Normalize heterogeneous validator output into one outcome shape.
// Dependencies: crate::core, roxmltree, serde_json, tracing
// ============================================================================

//! ## Overview
//! Each specification picks one [`ResultFormat`] in the catalog. Both
//! decoders take the raw payload plus the specification name and return a
//! [`ValidationOutcome`]. Any decode failure is recovered locally into the
//! unreadable sentinel; the caller never sees a parse error.
//!
//! Security posture: payloads come from a remote service and are untrusted.
//! DTDs are accepted for compatibility but entity expansion is bounded by the
//! XML parser's node limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use roxmltree::Document;
use roxmltree::ParsingOptions;
use serde::Deserialize;
use tracing::debug;
use tracing::warn;

use crate::core::DiagnosticEntry;
use crate::core::DiagnosticKind;
use crate::core::ResultCounts;
use crate::core::ResultFormat;
use crate::core::ValidationOutcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// XML namespace of the document validator output.
pub const DOCUMENT_NAMESPACE: &str = "http://voparis-validator.obspm.fr/";

/// `spec` attribute value carrying the VOTable validity flag.
const VOTABLE_SPEC: &str = "VOTable";

/// Message recorded when a JSON report has no text.
const MISSING_TEXT: &str = "N/A";

// ============================================================================
// SECTION: Decode Contract
// ============================================================================

impl ResultFormat {
    /// Decodes a validator payload for `spec`.
    ///
    /// Returns [`ValidationOutcome::unreadable`] when the payload cannot be decoded.
    #[must_use]
    pub fn decode(self, spec: &str, payload: &[u8]) -> ValidationOutcome {
        let decoded = match self {
            Self::Document => decode_document(spec, payload),
            Self::Json => decode_json(payload),
        };
        match decoded {
            Ok(outcome) => {
                debug!(
                    format = ?self,
                    result_vot = %outcome.result_vot,
                    result_spec = %outcome.result_spec,
                    nb_warn = outcome.counts.warnings,
                    nb_err = outcome.counts.errors,
                    nb_fatal = outcome.counts.fatals,
                    nb_fail = outcome.counts.failures,
                    "decoded validator payload"
                );
                outcome
            }
            Err(err) => {
                warn!(format = ?self, error = %err, bytes = payload.len(), "validator payload unreadable");
                ValidationOutcome::unreadable()
            }
        }
    }
}

// ============================================================================
// SECTION: Document Format
// ============================================================================

/// Decodes the XML document produced by the DAL validator.
fn decode_document(spec: &str, payload: &[u8]) -> Result<ValidationOutcome, String> {
    let text = std::str::from_utf8(payload).map_err(|err| format!("payload is not utf-8: {err}"))?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(text, options).map_err(|err| err.to_string())?;
    let root = document.root_element();

    let flag = |name: &str| {
        root.children()
            .find(|node| {
                node.has_tag_name((DOCUMENT_NAMESPACE, "valid")) && node.attribute("spec") == Some(name)
            })
            .and_then(|node| node.text())
            .unwrap_or_default()
            .to_string()
    };
    let named = |tag: &str| -> Vec<DiagnosticEntry> {
        root.children()
            .filter(|node| node.has_tag_name((DOCUMENT_NAMESPACE, tag)))
            .map(|node| DiagnosticEntry::named(node.attribute("name").unwrap_or_default()))
            .collect()
    };

    let warnings = named("warning");
    let errors = named("error");
    let fatals = named("fatal");
    Ok(ValidationOutcome {
        result_vot: flag(VOTABLE_SPEC),
        result_spec: flag(spec),
        counts: ResultCounts {
            warnings: count(&warnings),
            errors: count(&errors),
            fatals: count(&fatals),
            failures: 0,
        },
        warnings,
        errors,
        fatals,
        failures: Vec::new(),
    })
}

// ============================================================================
// SECTION: JSON Format
// ============================================================================

/// Top-level JSON report.
#[derive(Debug, Deserialize)]
struct JsonReport {
    /// Totals per level.
    totals: JsonTotals,
    /// Report sections.
    sections: Vec<JsonSection>,
}

/// Totals object of a JSON report.
#[derive(Debug, Deserialize)]
struct JsonTotals {
    /// Warning count.
    #[serde(rename = "WARNING")]
    warning: i64,
    /// Error count.
    #[serde(rename = "ERROR")]
    error: i64,
    /// Failure count.
    #[serde(rename = "FAILURE")]
    failure: i64,
}

/// One report section.
#[derive(Debug, Deserialize)]
struct JsonSection {
    /// Section code.
    code: String,
    /// Reports in the section.
    reports: Vec<JsonEntry>,
}

/// One report line.
#[derive(Debug, Deserialize)]
struct JsonEntry {
    /// Level (`WARNING`, `ERROR`, `FAILURE`, or informational levels).
    level: String,
    /// Report code.
    code: String,
    /// Report text.
    #[serde(default)]
    text: Option<String>,
}

/// Decodes the JSON report produced by the TAP validator.
fn decode_json(payload: &[u8]) -> Result<ValidationOutcome, String> {
    let report: JsonReport = serde_json::from_slice(payload).map_err(|err| err.to_string())?;
    let mut outcome = ValidationOutcome {
        counts: ResultCounts {
            warnings: report.totals.warning,
            errors: report.totals.error,
            fatals: 0,
            failures: report.totals.failure,
        },
        ..ValidationOutcome::default()
    };
    for section in report.sections {
        for entry in section.reports {
            let kind = match entry.level.as_str() {
                "WARNING" => DiagnosticKind::Warning,
                "ERROR" => DiagnosticKind::Error,
                "FAILURE" => DiagnosticKind::Failure,
                _ => continue,
            };
            let text = entry.text.unwrap_or_else(|| MISSING_TEXT.to_string());
            outcome.diagnostics_mut(kind).push(DiagnosticEntry::new(entry.code, text, section.code.clone()));
        }
    }
    Ok(outcome)
}

/// Converts a list length into a stored count.
fn count(entries: &[DiagnosticEntry]) -> i64 {
    i64::try_from(entries.len()).unwrap_or(i64::MAX)
}
