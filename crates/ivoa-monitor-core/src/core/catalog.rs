// crates/ivoa-monitor-core/src/core/catalog.rs
// ============================================================================
// Module: IVOA Monitor Specification Catalog
// Description: Service types, specification names, versions, and validator profiles.
// Purpose: Hold every fixed lookup table in one immutable value passed explicitly.
// Dependencies: crate::core::{identifiers, outcome}, serde, thiserror
// ============================================================================

//! ## Overview
//! The [`SpecCatalog`] maps standard-identifier prefixes to specification
//! names and default versions, and specification names to the validator
//! profile used to check them. It is built once at startup and shared by
//! reference; nothing mutates it afterwards.
//!
//! Standard identifiers are compared in lowercase, which is how the registry
//! stores them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::SpecName;
use crate::core::outcome::ResultFormat;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Namespace shared by every IVOA standard identifier.
pub const STANDARD_NAMESPACE: &str = "ivo://ivoa.net/std/";

/// Default base URL of the DAL (document format) validator.
pub const DEFAULT_DAL_VALIDATOR_URL: &str = "http://voparis-validator.obspm.fr/validator.php?format=XML&";

/// Default base URL of the TAP (JSON format) validator.
pub const DEFAULT_TAP_VALIDATOR_URL: &str =
    "http://voparis-validation.obspm.fr/tapvalidator.php?format=JSON&";

/// Cone search specification name.
pub const SPEC_CONE_SEARCH: &str = "Simple Cone Search";
/// Image access specification name.
pub const SPEC_IMAGE_ACCESS: &str = "Simple Image Access";
/// Spectral access specification name.
pub const SPEC_SPECTRAL_ACCESS: &str = "Simple Spectral Access";
/// Line access specification name.
pub const SPEC_LINE_ACCESS: &str = "Simple Line Access";
/// Table access specification name.
pub const SPEC_TABLE_ACCESS: &str = "Table Access Protocol";

/// Validator query parameters for image access version 2.0 services.
const SIAV2_PARAMS: &str = "REQUEST=query&POS=CIRCLE+180.0+60.0+0.5&FOV=0.00017+%2BInf&BAND=-Inf+%2BInf&TIME=45000.0+%2BInf&POL=&SPATRES=-Inf+200.0&EXPTIME=-Inf+3600&ID=&COLLECTION=&FACILITY=&INSTRUMENT=&DTYPE=image&CALIB=0+%2BInf&TARGET=&TIMERES=-Inf+10000.0&SPECRP=-Inf+%2BInf&FORMAT=&MAXREC=5";

// ============================================================================
// SECTION: Service Types
// ============================================================================

/// Service type requested from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// Simple Cone Search.
    ConeSearch,
    /// Simple Image Access version 1.
    Sia,
    /// Simple Spectral Access.
    Ssa,
    /// Table Access Protocol.
    Tap,
    /// Simple Image Access version 2.
    SiaV2,
}

impl ServiceType {
    /// Every supported service type.
    pub const ALL: [Self; 5] = [Self::ConeSearch, Self::Sia, Self::Ssa, Self::Tap, Self::SiaV2];

    /// Returns the command-line tag of the type.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::ConeSearch => "ConeSearch",
            Self::Sia => "SIA",
            Self::Ssa => "SSA",
            Self::Tap => "TAP",
            Self::SiaV2 => "SIAv2",
        }
    }

    /// Returns the standard-identifier prefix the type is registered under.
    #[must_use]
    pub const fn standard_prefix(self) -> &'static str {
        match self {
            Self::ConeSearch => "ivo://ivoa.net/std/conesearch",
            Self::Sia | Self::SiaV2 => "ivo://ivoa.net/std/sia",
            Self::Ssa => "ivo://ivoa.net/std/ssa",
            Self::Tap => "ivo://ivoa.net/std/tap",
        }
    }

    /// Returns true when `standard_id` belongs to this service type.
    ///
    /// Image access version 2 identifiers carry a `#query-[aux-]2.x` fragment
    /// on the `sia` prefix; they match [`ServiceType::SiaV2`] and never
    /// [`ServiceType::Sia`].
    #[must_use]
    pub fn matches(self, standard_id: &str) -> bool {
        let lowered = standard_id.to_ascii_lowercase();
        if !lowered.starts_with(self.standard_prefix()) {
            return false;
        }
        match self {
            Self::Sia => !is_siav2_identifier(&lowered),
            Self::SiaV2 => is_siav2_identifier(&lowered),
            Self::ConeSearch | Self::Ssa | Self::Tap => true,
        }
    }

    /// Returns the ADQL predicates restricting `rr.capability.standard_id` to this type.
    ///
    /// The predicates are a superset filter; [`ServiceType::matches`] is the
    /// exact test applied to every returned record.
    #[must_use]
    pub fn adql_predicates(self) -> Vec<String> {
        let siav2 = "standard_id LIKE 'ivo://ivoa.net/std/sia#query-%2.%'".to_string();
        match self {
            Self::SiaV2 => vec![siav2],
            Self::Sia => vec![
                "standard_id LIKE 'ivo://ivoa.net/std/sia%'".to_string(),
                format!("NOT ({siav2})"),
            ],
            Self::ConeSearch | Self::Ssa | Self::Tap => {
                vec![format!("standard_id LIKE '{}%'", self.standard_prefix())]
            }
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ServiceType {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CatalogError::UnknownServiceType(trimmed.to_string()))
    }
}

/// Returns true for `…/sia#query-2.x` and `…/sia#query-aux-2.x` identifiers.
fn is_siav2_identifier(lowered: &str) -> bool {
    let Some(fragment) = lowered.strip_prefix("ivo://ivoa.net/std/sia#query-") else {
        return false;
    };
    let fragment = fragment.strip_prefix("aux-").unwrap_or(fragment);
    fragment.starts_with("2.")
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The service-type tag is not one of the supported tags.
    #[error("unknown service type: {0}")]
    UnknownServiceType(String),
    /// The standard identifier's prefix has no specification entry.
    #[error("unknown specification for standard identifier prefix: {0}")]
    UnknownSpecification(String),
}

// ============================================================================
// SECTION: Catalog Entries
// ============================================================================

/// Specification registered under a standard-identifier prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    /// Lowercase standard-identifier prefix (no fragment).
    pub prefix: String,
    /// Specification name.
    pub spec: SpecName,
    /// Version used when neither fragment nor registry report one.
    pub default_version: String,
}

/// How a specification is submitted to its validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorProfile {
    /// Validator base URL, already ending in a query string; `None` when no validator exists.
    pub base_url: Option<String>,
    /// Default query parameters appended after the base URL.
    pub params: String,
    /// Payload format of the validator response.
    pub format: ResultFormat,
    /// Services sharing an access URL share one validation per day.
    pub shares_results_by_url: bool,
    /// Forward the caller's timeout (minus one second) to the validator.
    pub forward_timeout: bool,
    /// Maximum number of tables the validator should inspect.
    pub max_tables: Option<u32>,
}

/// Parameter set replacing a profile's defaults for one specification version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamOverride {
    /// Specification the override applies to.
    pub spec: SpecName,
    /// Exact version string the override applies to.
    pub version: String,
    /// Replacement parameters.
    pub params: String,
}

/// Validator endpoints used to build the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorEndpoints {
    /// Base URL of the document-format validator.
    pub dal: String,
    /// Base URL of the JSON-format validator.
    pub tap: String,
}

impl Default for ValidatorEndpoints {
    fn default() -> Self {
        Self {
            dal: DEFAULT_DAL_VALIDATOR_URL.to_string(),
            tap: DEFAULT_TAP_VALIDATOR_URL.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Immutable lookup tables for specifications and validators.
///
/// # Invariants
/// - Prefixes are lowercase and unique.
/// - Every entry's specification name has a validator profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCatalog {
    /// Entries keyed by lowercase prefix.
    entries: BTreeMap<String, SpecEntry>,
    /// Validator profiles keyed by specification name.
    profiles: BTreeMap<SpecName, ValidatorProfile>,
    /// Version-specific parameter overrides.
    overrides: Vec<ParamOverride>,
}

impl SpecCatalog {
    /// Builds the catalog with the default validator endpoints.
    #[must_use]
    pub fn builtin() -> Self {
        Self::with_endpoints(&ValidatorEndpoints::default())
    }

    /// Builds the catalog with explicit validator endpoints.
    #[must_use]
    pub fn with_endpoints(endpoints: &ValidatorEndpoints) -> Self {
        let specs = [
            ("ivo://ivoa.net/std/conesearch", SPEC_CONE_SEARCH, "1.03"),
            ("ivo://ivoa.net/std/sia", SPEC_IMAGE_ACCESS, "1.0"),
            ("ivo://ivoa.net/std/ssa", SPEC_SPECTRAL_ACCESS, "1.03"),
            ("ivo://ivoa.net/std/sla", SPEC_LINE_ACCESS, "1.0"),
            ("ivo://ivoa.net/std/tap", SPEC_TABLE_ACCESS, "1.0"),
        ];
        let entries = specs
            .into_iter()
            .map(|(prefix, spec, version)| {
                (
                    prefix.to_string(),
                    SpecEntry {
                        prefix: prefix.to_string(),
                        spec: SpecName::new(spec),
                        default_version: version.to_string(),
                    },
                )
            })
            .collect();

        let dal = |params: &str| ValidatorProfile {
            base_url: Some(endpoints.dal.clone()),
            params: params.to_string(),
            format: ResultFormat::Document,
            shares_results_by_url: false,
            forward_timeout: false,
            max_tables: None,
        };
        let mut profiles = BTreeMap::new();
        profiles.insert(SpecName::new(SPEC_CONE_SEARCH), dal("RA=180.0&DEC=60.0&SR=0.1"));
        profiles
            .insert(SpecName::new(SPEC_IMAGE_ACCESS), dal("POS=180.0,60.0&SIZE=0.1,0.1&FORMAT=ALL"));
        profiles.insert(
            SpecName::new(SPEC_SPECTRAL_ACCESS),
            dal("REQUEST=queryData&POS=180.0,60.0&SIZE=0.1&TIME=&BAND=&FORMAT=ALL"),
        );
        profiles.insert(
            SpecName::new(SPEC_LINE_ACCESS),
            ValidatorProfile {
                base_url: None,
                ..dal("")
            },
        );
        profiles.insert(
            SpecName::new(SPEC_TABLE_ACCESS),
            ValidatorProfile {
                base_url: Some(endpoints.tap.clone()),
                params: String::new(),
                format: ResultFormat::Json,
                shares_results_by_url: true,
                forward_timeout: true,
                max_tables: Some(1),
            },
        );

        let overrides = vec![ParamOverride {
            spec: SpecName::new(SPEC_IMAGE_ACCESS),
            version: "2.0".to_string(),
            params: SIAV2_PARAMS.to_string(),
        }];

        Self {
            entries,
            profiles,
            overrides,
        }
    }

    /// Returns the entry registered for a lowercase prefix.
    #[must_use]
    pub fn entry(&self, prefix: &str) -> Option<&SpecEntry> {
        self.entries.get(prefix)
    }

    /// Returns every entry in prefix order.
    pub fn entries(&self) -> impl Iterator<Item = &SpecEntry> {
        self.entries.values()
    }

    /// Returns the validator profile of a specification.
    #[must_use]
    pub fn profile(&self, spec: &str) -> Option<&ValidatorProfile> {
        self.profiles.get(&SpecName::new(spec))
    }

    /// Returns the validator parameters for a specification version.
    ///
    /// A version-specific override wins over the profile defaults. Unknown
    /// specifications yield empty parameters.
    #[must_use]
    pub fn params_for(&self, spec: &SpecName, version: &str) -> String {
        self.overrides
            .iter()
            .find(|entry| &entry.spec == spec && entry.version == version)
            .map(|entry| entry.params.clone())
            .or_else(|| self.profiles.get(spec).map(|profile| profile.params.clone()))
            .unwrap_or_default()
    }
}

impl Default for SpecCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
