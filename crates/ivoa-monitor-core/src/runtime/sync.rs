// crates/ivoa-monitor-core/src/runtime/sync.rs
// ============================================================================
// Module: IVOA Monitor Registry Sync
// Description: Upsert registry search results into the service store.
// Purpose: Keep `services` metadata current without touching validation results.
// Dependencies: crate::{core, interfaces}, thiserror, tracing
// ============================================================================

//! ## Overview
//! A sync pass searches the registry for one service type and, for every
//! returned record:
//!
//! 1. checks the record against the exact type predicate (the registry query
//!    is a superset filter);
//! 2. resolves the specification name, version, and validator parameters;
//! 3. inserts a bare row stamped with today's date when `(id, url)` is new;
//! 4. rewrites the descriptive and capability columns.
//!
//! Records with an unknown standard-identifier prefix are reported and
//! skipped; they never abort the pass. An answer the registry cut at its row
//! limit is still synced, and the report is flagged as truncated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::ACTIVE_STATUS;
use crate::core::CalendarDay;
use crate::core::CatalogError;
use crate::core::RegistryRecord;
use crate::core::ResolvedSpec;
use crate::core::ServiceKey;
use crate::core::ServiceMetadata;
use crate::core::ServiceType;
use crate::core::SpecCatalog;
use crate::core::StandardId;
use crate::core::contact_or_placeholder;
use crate::interfaces::RegistryError;
use crate::interfaces::RegistrySource;
use crate::interfaces::ServiceStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Sync failures that abort the pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The registry search failed.
    #[error("registry search failed: {0}")]
    Registry(String),
    /// The store reported an error.
    #[error("sync store error: {0}")]
    Store(String),
}

impl From<RegistryError> for SyncError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err.to_string())
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Result of syncing one registry record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// New row inserted, then refreshed.
    Inserted(ResolvedSpec),
    /// Existing row refreshed.
    Refreshed(ResolvedSpec),
    /// Record does not belong to the requested service type.
    Mismatched,
    /// Standard-identifier prefix has no catalog entry.
    UnknownSpecification {
        /// Lowercase prefix that failed to resolve.
        prefix: String,
    },
}

/// Record skipped because its specification is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStandard {
    /// Row key of the record.
    pub key: ServiceKey,
    /// Standard identifier as reported.
    pub standard_id: String,
}

/// Summary of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Service type requested.
    pub service_type: ServiceType,
    /// Records returned by the registry.
    pub fetched: usize,
    /// Rows inserted.
    pub inserted: usize,
    /// Existing rows refreshed.
    pub refreshed: usize,
    /// Records outside the requested type.
    pub mismatched: usize,
    /// Records with unknown specifications.
    pub unknown: Vec<UnknownStandard>,
    /// The registry answer was cut at its row limit.
    pub truncated: bool,
}

impl SyncReport {
    /// Creates an empty report.
    #[must_use]
    pub const fn new(service_type: ServiceType) -> Self {
        Self {
            service_type,
            fetched: 0,
            inserted: 0,
            refreshed: 0,
            mismatched: 0,
            unknown: Vec::new(),
            truncated: false,
        }
    }
}

// ============================================================================
// SECTION: Registry Sync
// ============================================================================

/// Registry-to-store synchronizer.
pub struct RegistrySync<'a, R, S> {
    /// Specification catalog.
    catalog: &'a SpecCatalog,
    /// Registry search backend.
    registry: &'a R,
    /// Service store.
    store: &'a S,
    /// Date stamped on inserted and refreshed rows.
    today: CalendarDay,
}

impl<'a, R, S> RegistrySync<'a, R, S>
where
    R: RegistrySource,
    S: ServiceStore,
{
    /// Creates a synchronizer.
    #[must_use]
    pub const fn new(catalog: &'a SpecCatalog, registry: &'a R, store: &'a S, today: CalendarDay) -> Self {
        Self {
            catalog,
            registry,
            store,
            today,
        }
    }

    /// Searches the registry for `service_type` and syncs every record.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the search or a store write fails.
    pub fn run(&self, service_type: ServiceType) -> Result<SyncReport, SyncError> {
        info!(service_type = %service_type, "searching registry");
        let answer = self.registry.search(service_type)?;
        let records = answer.records;
        let mut report = SyncReport::new(service_type);
        report.fetched = records.len();
        report.truncated = answer.truncated;
        info!(service_type = %service_type, records = records.len(), "registry search complete");
        if answer.truncated {
            warn!(
                service_type = %service_type,
                records = records.len(),
                "registry answer truncated at its row limit; services beyond it are not synced"
            );
        }

        for (position, record) in records.iter().enumerate() {
            debug!(service = %record.key(), "syncing record {}/{}", position + 1, records.len());
            match self.sync_record(service_type, record)? {
                RecordOutcome::Inserted(_) => report.inserted += 1,
                RecordOutcome::Refreshed(_) => report.refreshed += 1,
                RecordOutcome::Mismatched => report.mismatched += 1,
                RecordOutcome::UnknownSpecification { .. } => report.unknown.push(UnknownStandard {
                    key: record.key(),
                    standard_id: record.standard_id.clone(),
                }),
            }
        }
        info!(
            service_type = %service_type,
            inserted = report.inserted,
            refreshed = report.refreshed,
            mismatched = report.mismatched,
            unknown = report.unknown.len(),
            truncated = report.truncated,
            "registry sync complete"
        );
        Ok(report)
    }

    /// Syncs one registry record.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] when a store write fails.
    pub fn sync_record(&self, service_type: ServiceType, record: &RegistryRecord) -> Result<RecordOutcome, SyncError> {
        let key = record.key();
        if !service_type.matches(&record.standard_id) {
            debug!(service = %key, standard_id = %record.standard_id, "record outside requested type; skipped");
            return Ok(RecordOutcome::Mismatched);
        }

        let standard_id = StandardId::parse(&record.standard_id);
        let resolved = match self.catalog.resolve(&standard_id, &record.standard_version) {
            Ok(resolved) => resolved,
            Err(CatalogError::UnknownSpecification(prefix) | CatalogError::UnknownServiceType(prefix)) => {
                error!(service = %key, standard_id = %record.standard_id, "unknown specification; record skipped");
                return Ok(RecordOutcome::UnknownSpecification { prefix });
            }
        };
        debug!(
            service = %key,
            spec = %resolved.spec,
            specv = %resolved.version,
            version_source = ?resolved.version_source,
            "resolved specification"
        );

        let inserted = if self.store.service_exists(&key)? {
            false
        } else {
            info!(service = %key, "inserting new service");
            self.store.insert_service(&key, self.today)?;
            true
        };

        let metadata = ServiceMetadata {
            date_update: self.today,
            vor_created: record.created.clone(),
            vor_updated: record.updated.clone(),
            vor_status: ACTIVE_STATUS.to_string(),
            provenance: record.harvested_from.clone(),
            standard_id: record.standard_id.clone(),
            title: record.title.clone(),
            short_name: record.short_name.clone(),
            contact_name: contact_or_placeholder(&record.contact_name),
            contact_email: contact_or_placeholder(&record.contact_email),
            xsi_type: record.interface_type.clone(),
            spec: resolved.spec.clone(),
            specv: resolved.version.clone(),
            params: resolved.params.clone(),
        };
        self.store.refresh_metadata(&key, &metadata)?;
        info!(service = %key, spec = %resolved.spec, specv = %resolved.version, "service metadata refreshed");

        Ok(if inserted { RecordOutcome::Inserted(resolved) } else { RecordOutcome::Refreshed(resolved) })
    }
}
