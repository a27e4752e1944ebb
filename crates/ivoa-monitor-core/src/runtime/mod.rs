// crates/ivoa-monitor-core/src/runtime/mod.rs
// ============================================================================
// Module: IVOA Monitor Runtime
// Description: Registry sync, result parsing, reconciliation, and dispatch.
// Purpose: Execute monitor passes against the core interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime wires the interfaces together: [`RegistrySync`] fills the
//! store from the registry, [`Dispatcher`] fans due services out to workers,
//! and each worker's [`Reconciler`] calls the validator and merges results.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod dispatch;
pub mod parser;
pub mod reconciler;
pub mod store;
pub mod streak;
pub mod sync;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dispatch::DispatchError;
pub use dispatch::DispatchHandle;
pub use dispatch::Dispatcher;
pub use dispatch::WorkerReport;
pub use dispatch::partition;
pub use parser::DOCUMENT_NAMESPACE;
pub use reconciler::ReconcileError;
pub use reconciler::ReconcileOutcome;
pub use reconciler::ReconcileSettings;
pub use reconciler::Reconciler;
pub use reconciler::ValidationSource;
pub use reconciler::build_validator_url;
pub use store::InMemoryServiceStore;
pub use streak::StreakPolicy;
pub use streak::elapsed_days;
pub use streak::next_days_same;
pub use sync::RecordOutcome;
pub use sync::RegistrySync;
pub use sync::SyncError;
pub use sync::SyncReport;
pub use sync::UnknownStandard;
