// crates/ivoa-monitor-core/src/interfaces/mod.rs
// ============================================================================
// Module: IVOA Monitor Interfaces
// Description: Backend-agnostic interfaces for the registry, validators, and storage.
// Purpose: Define the contract surfaces used by the monitor runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The runtime talks to three collaborators: a registry that lists services
//! of a type, a validator that checks one service over HTTP, and a relational
//! store holding the `services` and `errors` tables. Each is a trait here so
//! the runtime can be exercised against in-memory doubles.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;

use crate::core::CalendarDay;
use crate::core::DiagnosticRecord;
use crate::core::DueService;
use crate::core::RegistryAnswer;
use crate::core::ResultSnapshot;
use crate::core::ResultWrite;
use crate::core::ServiceKey;
use crate::core::ServiceMetadata;
use crate::core::ServiceRow;
use crate::core::ServiceType;
use crate::core::SiblingResult;

// ============================================================================
// SECTION: Registry Source
// ============================================================================

/// Registry search errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry could not be reached.
    #[error("registry transport error: {0}")]
    Transport(String),
    /// The registry answered with a non-success status.
    #[error("registry returned http status {0}")]
    Status(u16),
    /// The registry reported a query error.
    #[error("registry query error: {0}")]
    Query(String),
    /// The registry response could not be decoded.
    #[error("registry response invalid: {0}")]
    Invalid(String),
}

/// Searchable catalog of services.
pub trait RegistrySource {
    /// Returns every capability interface registered for `service_type`,
    /// flagged as truncated when the registry hit its row limit.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the search cannot be completed.
    fn search(&self, service_type: ServiceType) -> Result<RegistryAnswer, RegistryError>;
}

// ============================================================================
// SECTION: Validator Client
// ============================================================================

/// One validator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorRequest {
    /// Fully assembled validator URL.
    pub url: String,
    /// Timeout for the whole call.
    pub timeout: Duration,
}

/// Classified result of a validator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorResponse {
    /// Status 200 and a fully read body.
    Body(Vec<u8>),
    /// The validator answered with a status other than 200.
    HttpStatus(u16),
    /// The request failed before a status was received.
    RequestFailed(String),
    /// The request timed out.
    TimedOut(String),
    /// Status 200 but the body could not be read.
    ReadFailed(String),
}

/// HTTP client for external validators.
pub trait ValidatorClient {
    /// Performs one validator call.
    ///
    /// Failures are classified into [`ValidatorResponse`] variants rather than
    /// returned as errors; the reconciler maps each one to a recorded outcome.
    fn fetch(&self, request: &ValidatorRequest) -> ValidatorResponse;
}

// ============================================================================
// SECTION: Service Store
// ============================================================================

/// Service store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("service store io error: {0}")]
    Io(String),
    /// Store data is invalid.
    #[error("service store invalid data: {0}")]
    Invalid(String),
    /// The addressed row does not exist.
    #[error("service store row not found: {0}")]
    NotFound(String),
    /// Store reported an error.
    #[error("service store error: {0}")]
    Store(String),
}

/// Persistence for the `services` and `errors` tables.
///
/// Every mutating call commits on its own; there are no multi-statement
/// transactions.
pub trait ServiceStore {
    /// Returns true when a row exists for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn service_exists(&self, key: &ServiceKey) -> Result<bool, StoreError>;

    /// Inserts a bare row stamped with its first-seen date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails, including on duplicate keys.
    fn insert_service(&self, key: &ServiceKey, date_insert: CalendarDay) -> Result<(), StoreError>;

    /// Rewrites descriptive and capability columns, leaving validation columns untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches `key`.
    fn refresh_metadata(&self, key: &ServiceKey, metadata: &ServiceMetadata) -> Result<(), StoreError>;

    /// Returns rows seen in the registry on or after `min_update`, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn due_services(&self, min_update: CalendarDay) -> Result<Vec<DueService>, StoreError>;

    /// Counts other rows with the same URL validated on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn count_validated_siblings(&self, key: &ServiceKey, date: CalendarDay) -> Result<u64, StoreError>;

    /// Returns the first other row with the same URL validated on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn first_validated_sibling(
        &self,
        key: &ServiceKey,
        date: CalendarDay,
    ) -> Result<Option<SiblingResult>, StoreError>;

    /// Returns the validation columns of a row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn result_snapshot(&self, key: &ServiceKey) -> Result<Option<ResultSnapshot>, StoreError>;

    /// Overwrites the validation columns of a row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches `key`.
    fn write_result(&self, key: &ServiceKey, result: &ResultWrite) -> Result<(), StoreError>;

    /// Returns true when an identical diagnostic row exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn diagnostic_exists(&self, record: &DiagnosticRecord) -> Result<bool, StoreError>;

    /// Inserts a diagnostic row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_diagnostic(&self, record: &DiagnosticRecord) -> Result<(), StoreError>;

    /// Returns the diagnostics of a service for one date, ordered by type and number.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn diagnostics_for(
        &self,
        key: &ServiceKey,
        date: CalendarDay,
    ) -> Result<Vec<DiagnosticRecord>, StoreError>;

    /// Returns the full row for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn service(&self, key: &ServiceKey) -> Result<Option<ServiceRow>, StoreError>;
}

/// Opens one exclusive store handle per worker.
pub trait StoreOpener: Send + Sync {
    /// Store handle produced by this opener.
    type Store: ServiceStore;

    /// Opens a new handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be opened.
    fn open(&self) -> Result<Self::Store, StoreError>;
}
