// crates/ivoa-monitor-core/src/runtime/store.rs
// ============================================================================
// Module: IVOA Monitor In-Memory Store
// Description: Simple in-memory service store for tests and examples.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of
//! [`ServiceStore`] with the same row semantics as the SQLite store. Clones
//! share the same tables, so it doubles as its own [`StoreOpener`]. It is not
//! intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::CalendarDay;
use crate::core::DiagnosticRecord;
use crate::core::DueService;
use crate::core::ResultSnapshot;
use crate::core::ResultWrite;
use crate::core::ServiceKey;
use crate::core::ServiceMetadata;
use crate::core::ServiceRow;
use crate::core::SiblingResult;
use crate::core::SpecName;
use crate::interfaces::ServiceStore;
use crate::interfaces::StoreError;
use crate::interfaces::StoreOpener;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Tables held by the in-memory store.
#[derive(Debug, Default)]
struct Tables {
    /// `services` rows keyed by `(id, url)`.
    services: BTreeMap<ServiceKey, ServiceRow>,
    /// `errors` rows in insertion order.
    errors: Vec<DiagnosticRecord>,
}

/// In-memory service store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryServiceStore {
    /// Tables protected by a mutex.
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryServiceStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a full row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn put_row(&self, row: ServiceRow) -> Result<(), StoreError> {
        self.lock()?.services.insert(row.key.clone(), row);
        Ok(())
    }

    /// Returns the number of stored diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn diagnostic_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.errors.len())
    }

    /// Locks the tables.
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Store("service store mutex poisoned".to_string()))
    }
}

impl ServiceStore for InMemoryServiceStore {
    fn service_exists(&self, key: &ServiceKey) -> Result<bool, StoreError> {
        Ok(self.lock()?.services.contains_key(key))
    }

    fn insert_service(&self, key: &ServiceKey, date_insert: CalendarDay) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.services.contains_key(key) {
            return Err(StoreError::Store(format!("duplicate service key: {key}")));
        }
        tables.services.insert(key.clone(), ServiceRow::bare(key.clone(), date_insert));
        Ok(())
    }

    fn refresh_metadata(&self, key: &ServiceKey, metadata: &ServiceMetadata) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let row = tables.services.get_mut(key).ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        row.date_update = Some(metadata.date_update.to_string());
        row.vor_created = Some(metadata.vor_created.clone());
        row.vor_updated = Some(metadata.vor_updated.clone());
        row.vor_status = Some(metadata.vor_status.clone());
        row.provenance = Some(metadata.provenance.clone());
        row.standard_id = Some(metadata.standard_id.clone());
        row.title = Some(metadata.title.clone());
        row.short_name = Some(metadata.short_name.clone());
        row.contact_name = Some(metadata.contact_name.clone());
        row.contact_email = Some(metadata.contact_email.clone());
        row.xsi_type = Some(metadata.xsi_type.clone());
        row.spec = Some(metadata.spec.as_str().to_string());
        row.specv = Some(metadata.specv.clone());
        row.params = Some(metadata.params.clone());
        Ok(())
    }

    fn due_services(&self, min_update: CalendarDay) -> Result<Vec<DueService>, StoreError> {
        let threshold = min_update.to_string();
        let tables = self.lock()?;
        Ok(tables
            .services
            .values()
            .filter(|row| row.date_update.as_deref().is_some_and(|date| date >= threshold.as_str()))
            .map(|row| DueService {
                key: row.key.clone(),
                spec: SpecName::new(row.spec.clone().unwrap_or_default()),
                specv: row.specv.clone().unwrap_or_default(),
                params: row.params.clone().unwrap_or_default(),
            })
            .collect())
    }

    fn count_validated_siblings(&self, key: &ServiceKey, date: CalendarDay) -> Result<u64, StoreError> {
        let count = self.validated_siblings(key, date)?.len();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    fn first_validated_sibling(
        &self,
        key: &ServiceKey,
        date: CalendarDay,
    ) -> Result<Option<SiblingResult>, StoreError> {
        Ok(self.validated_siblings(key, date)?.into_iter().next())
    }

    fn result_snapshot(&self, key: &ServiceKey) -> Result<Option<ResultSnapshot>, StoreError> {
        Ok(self.lock()?.services.get(key).map(|row| row.result.clone()))
    }

    fn write_result(&self, key: &ServiceKey, result: &ResultWrite) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let row = tables.services.get_mut(key).ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        row.result = ResultSnapshot {
            val_mode: result.val_mode,
            result_vot: result.result_vot.clone(),
            result_spec: result.result_spec.clone(),
            counts: result.counts,
            date: Some(result.date.to_string()),
            days_same: result.days_same,
        };
        Ok(())
    }

    fn diagnostic_exists(&self, record: &DiagnosticRecord) -> Result<bool, StoreError> {
        Ok(self.lock()?.errors.iter().any(|existing| existing == record))
    }

    fn insert_diagnostic(&self, record: &DiagnosticRecord) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let duplicate = tables.errors.iter().any(|existing| {
            existing.key == record.key
                && existing.date == record.date
                && existing.kind == record.kind
                && existing.num == record.num
                && existing.entry.name == record.entry.name
        });
        if duplicate {
            return Err(StoreError::Store(format!("duplicate diagnostic for {}", record.key)));
        }
        tables.errors.push(record.clone());
        Ok(())
    }

    fn diagnostics_for(
        &self,
        key: &ServiceKey,
        date: CalendarDay,
    ) -> Result<Vec<DiagnosticRecord>, StoreError> {
        let tables = self.lock()?;
        let mut records: Vec<DiagnosticRecord> = tables
            .errors
            .iter()
            .filter(|record| &record.key == key && record.date == date)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.kind.as_str().cmp(b.kind.as_str()).then(a.num.cmp(&b.num)));
        Ok(records)
    }

    fn service(&self, key: &ServiceKey) -> Result<Option<ServiceRow>, StoreError> {
        Ok(self.lock()?.services.get(key).cloned())
    }
}

impl InMemoryServiceStore {
    /// Returns other rows sharing `key.url` validated on `date`, in key order.
    fn validated_siblings(&self, key: &ServiceKey, date: CalendarDay) -> Result<Vec<SiblingResult>, StoreError> {
        let day = date.to_string();
        let tables = self.lock()?;
        Ok(tables
            .services
            .values()
            .filter(|row| {
                row.key.url == key.url && row.key.id != key.id && row.result.date.as_deref() == Some(day.as_str())
            })
            .map(|row| SiblingResult {
                key: row.key.clone(),
                snapshot: row.result.clone(),
            })
            .collect())
    }
}

impl StoreOpener for InMemoryServiceStore {
    type Store = Self;

    fn open(&self) -> Result<Self::Store, StoreError> {
        Ok(self.clone())
    }
}
