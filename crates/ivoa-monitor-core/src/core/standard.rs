// crates/ivoa-monitor-core/src/core/standard.rs
// ============================================================================
// Module: IVOA Monitor Standard Identifiers
// Description: Split standard identifiers and derive specification versions.
// Purpose: Turn ambiguous registry capability fields into a concrete spec and version.
// Dependencies: crate::core::{catalog, identifiers}, serde
// ============================================================================

//! ## Overview
//! A standard identifier looks like `ivo://ivoa.net/std/sia#query-aux-2.0`:
//! a namespace prefix, optionally followed by a `#` fragment. The prefix
//! selects the specification; the version comes from the first rule that
//! applies:
//!
//! 1. the fragment, when it reads `#query-[aux-]VERSION` with a numeric VERSION;
//! 2. the version reported by the registry, when non-empty;
//! 3. the catalog default for the prefix.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::catalog::CatalogError;
use crate::core::catalog::SpecCatalog;
use crate::core::identifiers::SpecName;

// ============================================================================
// SECTION: Standard Identifier
// ============================================================================

/// A standard identifier split into prefix and fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardId {
    /// Identifier as reported by the registry.
    raw: String,
    /// Lowercase text before the first `#`.
    prefix: String,
    /// Lowercase text from the first `#` on, including the `#`.
    fragment: Option<String>,
}

impl StandardId {
    /// Splits a standard identifier at its first `#`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        let (prefix, fragment) = match lowered.find('#') {
            Some(index) => (lowered[.. index].to_string(), Some(lowered[index ..].to_string())),
            None => (lowered, None),
        };
        Self {
            raw: raw.to_string(),
            prefix,
            fragment,
        }
    }

    /// Returns the identifier as reported.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the lowercase prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the lowercase fragment including `#`, if any.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Returns the version encoded in a `#query-[aux-]VERSION` fragment.
    #[must_use]
    pub fn fragment_version(&self) -> Option<&str> {
        let rest = self.fragment.as_deref()?.strip_prefix("#query-")?;
        let version = rest.strip_prefix("aux-").unwrap_or(rest);
        is_numeric_version(version).then_some(version)
    }
}

/// Returns true for digits with at most one decimal point, such as `2`, `1.03` or `.5`.
fn is_numeric_version(value: &str) -> bool {
    let without_point = value.replacen('.', "", 1);
    !without_point.is_empty() && without_point.bytes().all(|byte| byte.is_ascii_digit())
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Which rule produced a specification version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    /// Parsed from the identifier fragment.
    Fragment,
    /// Taken from the registry's reported standard version.
    Reported,
    /// Catalog default for the prefix.
    Default,
}

/// Specification, version, and validator parameters derived for a capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSpec {
    /// Specification name.
    pub spec: SpecName,
    /// Specification version.
    pub version: String,
    /// Rule that produced the version.
    pub version_source: VersionSource,
    /// Default validator parameters.
    pub params: String,
}

impl SpecCatalog {
    /// Resolves a standard identifier and reported version to a specification.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownSpecification`] when the prefix has no entry.
    pub fn resolve(
        &self,
        standard_id: &StandardId,
        reported_version: &str,
    ) -> Result<ResolvedSpec, CatalogError> {
        let entry = self
            .entry(standard_id.prefix())
            .ok_or_else(|| CatalogError::UnknownSpecification(standard_id.prefix().to_string()))?;
        let reported = reported_version.trim();
        let (version, version_source) = if let Some(version) = standard_id.fragment_version() {
            (version.to_string(), VersionSource::Fragment)
        } else if !reported.is_empty() {
            (reported.to_string(), VersionSource::Reported)
        } else {
            (entry.default_version.clone(), VersionSource::Default)
        };
        let params = self.params_for(&entry.spec, &version);
        Ok(ResolvedSpec {
            spec: entry.spec.clone(),
            version,
            version_source,
            params,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
