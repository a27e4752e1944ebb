// crates/ivoa-monitor-core/src/core/identifiers.rs
// ============================================================================
// Module: IVOA Monitor Identifiers
// Description: Opaque identifiers for registry services and specifications.
// Purpose: Provide strongly typed identifiers with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Services are keyed by the pair (registry identifier, access URL). A single
//! registry resource may expose several access URLs, and several resources
//! may share one URL, so neither half is unique on its own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Registry identifier (`ivo://` resource identifier) of a service.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    /// Creates a new service identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Human-readable specification name (for example `Simple Cone Search`).
///
/// # Invariants
/// - Matches the names understood by the external validators verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecName(String);

impl SpecName {
    /// Creates a new specification name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique key of a service row.
///
/// # Invariants
/// - `(id, url)` is globally unique in the `services` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceKey {
    /// Registry identifier.
    pub id: ServiceId,
    /// Access URL of the service interface.
    pub url: String,
}

impl ServiceKey {
    /// Creates a service key from its parts.
    #[must_use]
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: ServiceId::new(id),
            url: url.into(),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.id, self.url)
    }
}
