// crates/ivoa-monitor-store-sqlite/src/lib.rs
// ============================================================================
// Module: IVOA Monitor SQLite Store
// Description: SQLite implementation of the service store.
// Purpose: Persist registry metadata, validation results, and diagnostics.
// Dependencies: ivoa-monitor-core, rusqlite
// ============================================================================

//! ## Overview
//! Durable [`ivoa_monitor_core::ServiceStore`] backed by a single `SQLite`
//! file. Each worker opens its own connection through [`SqliteStoreOpener`].

pub mod store;

pub use store::SqliteJournalMode;
pub use store::SqliteServiceStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreOpener;
pub use store::SqliteSyncMode;
