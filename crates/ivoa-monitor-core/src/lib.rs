// crates/ivoa-monitor-core/src/lib.rs
// ============================================================================
// Module: IVOA Monitor Core Library
// Description: Public API surface for the IVOA service monitor core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The monitor core keeps a local record of registry services and their
//! latest validator results. It syncs service metadata from a registry,
//! decides per service whether to call the validator or reuse a same-day
//! result, and merges outcomes with a days-unchanged streak. Backends plug in
//! through explicit interfaces; this crate performs no network or disk I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::RegistryError;
pub use interfaces::RegistrySource;
pub use interfaces::ServiceStore;
pub use interfaces::StoreError;
pub use interfaces::StoreOpener;
pub use interfaces::ValidatorClient;
pub use interfaces::ValidatorRequest;
pub use interfaces::ValidatorResponse;
pub use runtime::DispatchError;
pub use runtime::DispatchHandle;
pub use runtime::Dispatcher;
pub use runtime::InMemoryServiceStore;
pub use runtime::ReconcileError;
pub use runtime::ReconcileOutcome;
pub use runtime::ReconcileSettings;
pub use runtime::Reconciler;
pub use runtime::RecordOutcome;
pub use runtime::RegistrySync;
pub use runtime::StreakPolicy;
pub use runtime::SyncError;
pub use runtime::SyncReport;
pub use runtime::UnknownStandard;
pub use runtime::ValidationSource;
pub use runtime::WorkerReport;
pub use runtime::build_validator_url;
pub use runtime::partition;
