// crates/ivoa-monitor-core/src/core/service.rs
// ============================================================================
// Module: IVOA Monitor Service Records
// Description: Registry records, persisted service rows, and result snapshots.
// Purpose: Define the values passed between sync, store, and reconciler.
// Dependencies: crate::core::{calendar, identifiers, outcome}, serde
// ============================================================================

//! ## Overview
//! These are transient, in-process views of the `services` table. The store
//! owns the rows; sync and reconciliation read and write them through the
//! [`crate::interfaces::ServiceStore`] trait using the narrow structs below.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ServiceKey;
use crate::core::identifiers::SpecName;
use crate::core::outcome::DiagnosticEntry;
use crate::core::outcome::DiagnosticKind;
use crate::core::outcome::ResultCounts;
use crate::core::calendar::CalendarDay;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Value stored for blank contact fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Registry status recorded for every service seen in the registry.
pub const ACTIVE_STATUS: &str = "active";

// ============================================================================
// SECTION: Registry Records
// ============================================================================

/// One capability interface returned by the registry search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// Resource identifier.
    pub ivoid: String,
    /// Interface access URL.
    pub access_url: String,
    /// Resource title.
    pub title: String,
    /// Resource short name.
    pub short_name: String,
    /// Capability standard identifier.
    pub standard_id: String,
    /// Interface type (`vs:paramhttp`).
    pub interface_type: String,
    /// Standard version reported by the registry, possibly empty.
    pub standard_version: String,
    /// Resource creation timestamp.
    pub created: String,
    /// Resource update timestamp.
    pub updated: String,
    /// Identifier of the registry the record was harvested from.
    pub harvested_from: String,
    /// Contact role name, possibly empty.
    pub contact_name: String,
    /// Contact email, possibly empty.
    pub contact_email: String,
}

impl RegistryRecord {
    /// Returns the `(id, url)` key of the record.
    #[must_use]
    pub fn key(&self) -> ServiceKey {
        ServiceKey::new(self.ivoid.clone(), self.access_url.clone())
    }
}

/// Records returned by one registry search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryAnswer {
    /// Records in registry order.
    pub records: Vec<RegistryRecord>,
    /// The registry stopped at its row limit; more records exist.
    pub truncated: bool,
}

impl RegistryAnswer {
    /// Creates an answer holding every matching record.
    #[must_use]
    pub const fn complete(records: Vec<RegistryRecord>) -> Self {
        Self {
            records,
            truncated: false,
        }
    }

    /// Creates an answer cut at the registry's row limit.
    #[must_use]
    pub const fn truncated(records: Vec<RegistryRecord>) -> Self {
        Self {
            records,
            truncated: true,
        }
    }
}

// ============================================================================
// SECTION: Metadata Refresh
// ============================================================================

/// Descriptive and capability columns rewritten on every sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    /// Date the service was last seen in the registry.
    pub date_update: CalendarDay,
    /// Registry creation timestamp.
    pub vor_created: String,
    /// Registry update timestamp.
    pub vor_updated: String,
    /// Registry status, always `active`.
    pub vor_status: String,
    /// Provenance registry identifier.
    pub provenance: String,
    /// Standard identifier as reported.
    pub standard_id: String,
    /// Resource title.
    pub title: String,
    /// Resource short name.
    pub short_name: String,
    /// Contact name, `N/A` when blank.
    pub contact_name: String,
    /// Contact email, `N/A` when blank.
    pub contact_email: String,
    /// Interface type.
    pub xsi_type: String,
    /// Specification name.
    pub spec: SpecName,
    /// Specification version.
    pub specv: String,
    /// Default validator parameters.
    pub params: String,
}

/// Replaces a blank contact field with `N/A`.
#[must_use]
pub fn contact_or_placeholder(value: &str) -> String {
    if value.trim().is_empty() { NOT_AVAILABLE.to_string() } else { value.to_string() }
}

// ============================================================================
// SECTION: Validation Mode
// ============================================================================

/// How a service's stored result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Validation has not run.
    NotRun,
    /// Result recorded by a regular validation pass.
    Normal,
    /// Result recorded by a batch pass.
    Batch,
}

impl ValidationMode {
    /// Returns the value stored in `services.val_mode`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotRun => "not_run",
            Self::Normal => "normal",
            Self::Batch => "batch",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "not_run" => Ok(Self::NotRun),
            "normal" => Ok(Self::Normal),
            "batch" => Ok(Self::Batch),
            other => Err(format!("unknown validation mode: {other}")),
        }
    }
}

// ============================================================================
// SECTION: Result Snapshots
// ============================================================================

/// Validation columns of a service row.
///
/// Text columns are raw: dates stay strings here because rows written by
/// other tools may hold anything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultSnapshot {
    /// Validation mode, `None` when never validated.
    pub val_mode: Option<ValidationMode>,
    /// VOTable validity flag.
    pub result_vot: String,
    /// Specification conformance flag.
    pub result_spec: String,
    /// Diagnostic counts.
    pub counts: ResultCounts,
    /// Last validation date, `None` when never validated.
    pub date: Option<String>,
    /// Days-unchanged streak.
    pub days_same: i64,
}

/// Validation columns written by a merge or a sibling copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultWrite {
    /// Validation date.
    pub date: CalendarDay,
    /// Validation mode, copied as-is from a sibling (possibly unset).
    pub val_mode: Option<ValidationMode>,
    /// VOTable validity flag.
    pub result_vot: String,
    /// Specification conformance flag.
    pub result_spec: String,
    /// Diagnostic counts.
    pub counts: ResultCounts,
    /// Days-unchanged streak.
    pub days_same: i64,
}

/// Another service sharing an access URL, already validated on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingResult {
    /// Key of the sibling row.
    pub key: ServiceKey,
    /// Its validation columns.
    pub snapshot: ResultSnapshot,
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// A service selected for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueService {
    /// Row key.
    pub key: ServiceKey,
    /// Specification name.
    pub spec: SpecName,
    /// Specification version.
    pub specv: String,
    /// Validator parameters.
    pub params: String,
}

/// Full `services` row, used by diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRow {
    /// Row key.
    pub key: ServiceKey,
    /// Resource title.
    pub title: Option<String>,
    /// Resource short name.
    pub short_name: Option<String>,
    /// First date the service was seen.
    pub date_insert: Option<String>,
    /// Last date the service was seen.
    pub date_update: Option<String>,
    /// Registry status.
    pub vor_status: Option<String>,
    /// Registry creation timestamp.
    pub vor_created: Option<String>,
    /// Registry update timestamp.
    pub vor_updated: Option<String>,
    /// Contact name.
    pub contact_name: Option<String>,
    /// Contact email.
    pub contact_email: Option<String>,
    /// Provenance registry identifier.
    pub provenance: Option<String>,
    /// Standard identifier.
    pub standard_id: Option<String>,
    /// Interface type.
    pub xsi_type: Option<String>,
    /// Specification name.
    pub spec: Option<String>,
    /// Specification version.
    pub specv: Option<String>,
    /// Validator parameters.
    pub params: Option<String>,
    /// Validation columns.
    pub result: ResultSnapshot,
}

impl ServiceRow {
    /// Creates a bare row as inserted on first sight.
    #[must_use]
    pub fn bare(key: ServiceKey, date_insert: CalendarDay) -> Self {
        Self {
            key,
            title: None,
            short_name: None,
            date_insert: Some(date_insert.to_string()),
            date_update: None,
            vor_status: None,
            vor_created: None,
            vor_updated: None,
            contact_name: None,
            contact_email: None,
            provenance: None,
            standard_id: None,
            xsi_type: None,
            spec: None,
            specv: None,
            params: None,
            result: ResultSnapshot::default(),
        }
    }
}

/// A stored diagnostic row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// Service key.
    pub key: ServiceKey,
    /// Validation date.
    pub date: CalendarDay,
    /// Category.
    pub kind: DiagnosticKind,
    /// Sequence number within the category, starting at 1.
    pub num: i64,
    /// Diagnostic fields.
    pub entry: DiagnosticEntry,
}
