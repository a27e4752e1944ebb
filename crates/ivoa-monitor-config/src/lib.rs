// crates/ivoa-monitor-config/src/lib.rs
// ============================================================================
// Module: IVOA Monitor Config Library
// Description: Configuration model, loading, and validation.
// Purpose: Single source of truth for ivoa-monitor.toml semantics.
// Dependencies: ivoa-monitor-core, ivoa-monitor-providers, ivoa-monitor-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `ivoa-monitor-config` defines the optional configuration file read by
//! the CLI. Every field has a built-in default, so a missing default file
//! is not an error; an explicitly named file must exist and validate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
