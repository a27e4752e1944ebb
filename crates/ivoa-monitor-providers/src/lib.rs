// crates/ivoa-monitor-providers/src/lib.rs
// ============================================================================
// Module: IVOA Monitor Providers
// Description: HTTP implementations of the registry and validator interfaces.
// Purpose: Talk to the TAP registry and the conformance validators.
// Dependencies: ivoa-monitor-core, reqwest, roxmltree, url
// ============================================================================

//! ## Overview
//! This crate ships the network collaborators used by the CLI:
//! - [`TapRegistryClient`] queries a TAP registry with ADQL and decodes the
//!   VOTable response into [`ivoa_monitor_core::RegistryRecord`]s.
//! - [`HttpValidatorClient`] issues validator GETs and classifies each
//!   exchange as a body, a non-200 status, a timeout, or a failure.
//!
//! Both clients are blocking and bound every request with a timeout.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod client;
pub mod registry;
pub mod validator;
pub mod votable;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::ProviderError;
pub use registry::DEFAULT_MAX_RECORDS;
pub use registry::DEFAULT_REGISTRY_URL;
pub use registry::TapRegistryClient;
pub use registry::TapRegistryConfig;
pub use registry::adql_query;
pub use validator::HttpValidatorClient;
pub use validator::HttpValidatorConfig;
pub use votable::parse_registry_records;
