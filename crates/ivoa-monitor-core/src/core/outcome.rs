// crates/ivoa-monitor-core/src/core/outcome.rs
// ============================================================================
// Module: IVOA Monitor Validation Outcomes
// Description: Normalized validator results and diagnostic records.
// Purpose: Give both validator payload formats one result shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ValidationOutcome`] is what the reconciler merges into the store,
//! whether it came from a parsed validator payload or from a classified
//! transport failure. Counts use negative sentinels for failures so the
//! stored row still records that a validation attempt happened.
//!
//! Security posture: payload-derived strings are stored verbatim and never
//! interpreted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Sentinels
// ============================================================================

/// Count value recorded when the validator request failed or its payload was unreadable.
pub const UNREADABLE_COUNT: i64 = -1;

/// Count value recorded when the validator request timed out.
pub const TIMEOUT_COUNT: i64 = -2;

// ============================================================================
// SECTION: Result Format
// ============================================================================

/// Payload format produced by a validator endpoint.
///
/// # Invariants
/// - Chosen once per specification; decoding is implemented in the runtime parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    /// Structured XML document from the DAL validator.
    Document,
    /// JSON report from the TAP validator.
    Json,
}

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// Severity category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Validator warning.
    Warning,
    /// Validator error.
    Error,
    /// Fatal condition (document validator only).
    Fatal,
    /// Failure (JSON validator only).
    Failure,
}

impl DiagnosticKind {
    /// All categories in merge order.
    pub const ALL: [Self; 4] = [Self::Warning, Self::Error, Self::Fatal, Self::Failure];

    /// Returns the value stored in the `errors.type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagnosticKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            "failure" => Ok(Self::Failure),
            other => Err(format!("unknown diagnostic type: {other}")),
        }
    }
}

/// One diagnostic emitted by a validator run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    /// Diagnostic code or name.
    pub name: String,
    /// Human-readable message, empty when the validator does not provide one.
    pub msg: String,
    /// Section of the validator report, empty when not provided.
    pub section: String,
}

impl DiagnosticEntry {
    /// Creates a diagnostic entry.
    #[must_use]
    pub fn new(name: impl Into<String>, msg: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            msg: msg.into(),
            section: section.into(),
        }
    }

    /// Creates an entry carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, "", "")
    }
}

// ============================================================================
// SECTION: Counts
// ============================================================================

/// Diagnostic counts recorded on the service row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultCounts {
    /// `nb_warn`.
    pub warnings: i64,
    /// `nb_err`.
    pub errors: i64,
    /// `nb_fatal`.
    pub fatals: i64,
    /// `nb_fail`.
    pub failures: i64,
}

impl ResultCounts {
    /// Returns counts with every field set to `value`.
    #[must_use]
    pub const fn uniform(value: i64) -> Self {
        Self {
            warnings: value,
            errors: value,
            fatals: value,
            failures: value,
        }
    }
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Normalized result of one validation attempt.
///
/// # Invariants
/// - Sentinel outcomes carry empty flags and empty diagnostic lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// VOTable validity flag (`"yes"`, `"no"` or empty).
    pub result_vot: String,
    /// Specification conformance flag (`"yes"`, `"no"` or empty).
    pub result_spec: String,
    /// Diagnostic counts.
    pub counts: ResultCounts,
    /// Warnings in validator order.
    pub warnings: Vec<DiagnosticEntry>,
    /// Errors in validator order.
    pub errors: Vec<DiagnosticEntry>,
    /// Fatals in validator order.
    pub fatals: Vec<DiagnosticEntry>,
    /// Failures in validator order.
    pub failures: Vec<DiagnosticEntry>,
}

impl ValidationOutcome {
    /// Outcome recorded when the request failed or the payload could not be decoded.
    #[must_use]
    pub fn unreadable() -> Self {
        Self::sentinel(UNREADABLE_COUNT)
    }

    /// Outcome recorded when the validator request timed out.
    #[must_use]
    pub fn timed_out() -> Self {
        Self::sentinel(TIMEOUT_COUNT)
    }

    /// Builds a sentinel outcome with all counts set to `value`.
    fn sentinel(value: i64) -> Self {
        Self {
            counts: ResultCounts::uniform(value),
            ..Self::default()
        }
    }

    /// Returns the diagnostics of one category.
    #[must_use]
    pub fn diagnostics(&self, kind: DiagnosticKind) -> &[DiagnosticEntry] {
        match kind {
            DiagnosticKind::Warning => &self.warnings,
            DiagnosticKind::Error => &self.errors,
            DiagnosticKind::Fatal => &self.fatals,
            DiagnosticKind::Failure => &self.failures,
        }
    }

    /// Returns the diagnostics of one category for mutation.
    pub fn diagnostics_mut(&mut self, kind: DiagnosticKind) -> &mut Vec<DiagnosticEntry> {
        match kind {
            DiagnosticKind::Warning => &mut self.warnings,
            DiagnosticKind::Error => &mut self.errors,
            DiagnosticKind::Fatal => &mut self.fatals,
            DiagnosticKind::Failure => &mut self.failures,
        }
    }

    /// Returns true when the counts carry a failure sentinel.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        self.counts.warnings < 0
    }
}
