// crates/ivoa-monitor-core/src/core/mod.rs
// ============================================================================
// Module: IVOA Monitor Core Types
// Description: Service records, specification catalog, and validation outcomes.
// Purpose: Provide the stable value types shared by every monitor component.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Core types describe what the registry reports, what the store persists,
//! and what a validator run produced. They carry no I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod calendar;
pub mod catalog;
pub mod identifiers;
pub mod outcome;
pub mod service;
pub mod standard;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use calendar::CalendarDay;
pub use calendar::DayParseError;
pub use catalog::CatalogError;
pub use catalog::DEFAULT_DAL_VALIDATOR_URL;
pub use catalog::DEFAULT_TAP_VALIDATOR_URL;
pub use catalog::ParamOverride;
pub use catalog::SPEC_CONE_SEARCH;
pub use catalog::SPEC_IMAGE_ACCESS;
pub use catalog::SPEC_LINE_ACCESS;
pub use catalog::SPEC_SPECTRAL_ACCESS;
pub use catalog::SPEC_TABLE_ACCESS;
pub use catalog::STANDARD_NAMESPACE;
pub use catalog::ServiceType;
pub use catalog::SpecCatalog;
pub use catalog::SpecEntry;
pub use catalog::ValidatorEndpoints;
pub use catalog::ValidatorProfile;
pub use identifiers::ServiceId;
pub use identifiers::ServiceKey;
pub use identifiers::SpecName;
pub use outcome::DiagnosticEntry;
pub use outcome::DiagnosticKind;
pub use outcome::ResultCounts;
pub use outcome::ResultFormat;
pub use outcome::TIMEOUT_COUNT;
pub use outcome::UNREADABLE_COUNT;
pub use outcome::ValidationOutcome;
pub use service::ACTIVE_STATUS;
pub use service::DiagnosticRecord;
pub use service::DueService;
pub use service::NOT_AVAILABLE;
pub use service::RegistryAnswer;
pub use service::RegistryRecord;
pub use service::ResultSnapshot;
pub use service::ResultWrite;
pub use service::ServiceMetadata;
pub use service::ServiceRow;
pub use service::SiblingResult;
pub use service::ValidationMode;
pub use service::contact_or_placeholder;
pub use standard::ResolvedSpec;
pub use standard::StandardId;
pub use standard::VersionSource;
