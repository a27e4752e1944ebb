// crates/ivoa-monitor-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Service Store
// Description: Durable ServiceStore backed by SQLite.
// Purpose: Persist services, validation results, and diagnostics across runs.
// Dependencies: ivoa-monitor-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This module implements [`ServiceStore`] over two tables:
//!
//! - `services`: one row per `(id, url)` holding registry metadata and the
//!   latest validation result (`val_mode`, `result_*`, `nb_*`, `date`,
//!   `days_same`).
//! - `errors`: one row per recorded diagnostic, unique on
//!   `(id, url, date, type, num, name)`.
//!
//! Both tables are created on first open. Every connection applies the
//! configured journal and sync pragmas plus a busy timeout, so parallel
//! workers holding their own connection wait on each other instead of
//! failing with `SQLITE_BUSY`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use ivoa_monitor_core::CalendarDay;
use ivoa_monitor_core::DiagnosticEntry;
use ivoa_monitor_core::DiagnosticKind;
use ivoa_monitor_core::DiagnosticRecord;
use ivoa_monitor_core::DueService;
use ivoa_monitor_core::ResultCounts;
use ivoa_monitor_core::ResultSnapshot;
use ivoa_monitor_core::ResultWrite;
use ivoa_monitor_core::ServiceKey;
use ivoa_monitor_core::ServiceMetadata;
use ivoa_monitor_core::ServiceRow;
use ivoa_monitor_core::ServiceStore;
use ivoa_monitor_core::SiblingResult;
use ivoa_monitor_core::SpecName;
use ivoa_monitor_core::StoreError;
use ivoa_monitor_core::StoreOpener;
use ivoa_monitor_core::ValidationMode;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 30_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Table and index definitions.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS services (
    id TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT,
    short_name TEXT,
    date_insert TEXT,
    date_update TEXT,
    vor_status TEXT,
    vor_created TEXT,
    vor_updated TEXT,
    contact_name TEXT,
    contact_email TEXT,
    provenance TEXT,
    date TEXT,
    standard_id TEXT,
    xsi_type TEXT,
    spec TEXT,
    specv TEXT,
    params TEXT,
    val_mode TEXT,
    result_vot TEXT,
    result_spec TEXT,
    nb_warn INTEGER,
    nb_err INTEGER,
    nb_fail INTEGER,
    nb_fatal INTEGER,
    days_same INTEGER DEFAULT 0
);
CREATE UNIQUE INDEX IF NOT EXISTS services_pk ON services (id, url);
CREATE TABLE IF NOT EXISTS errors (
    id TEXT NOT NULL,
    url TEXT NOT NULL,
    date TEXT NOT NULL,
    type TEXT NOT NULL,
    num INTEGER NOT NULL,
    name TEXT,
    msg TEXT,
    section TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS errors_pk ON errors (id, url, date, type, num, name);
";

/// Columns of the result snapshot, in [`RawSnapshot`] order.
const SNAPSHOT_COLUMNS: &str =
    "val_mode, result_vot, result_spec, nb_warn, nb_err, nb_fatal, nb_fail, date, days_same";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    Full,
    /// Normal synchronous mode.
    #[default]
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` service store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default pragmas for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Invalid configuration or stored data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Row to update does not exist.
    #[error("sqlite store row not found: {0}")]
    NotFound(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::NotFound(message) => Self::NotFound(message),
        }
    }
}

/// Maps an engine error into [`SqliteStoreError::Db`].
#[allow(clippy::needless_pass_by_value, reason = "Used directly as a map_err callback.")]
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed service store.
///
/// # Invariants
/// - Connection access is serialized through a mutex.
/// - Both tables and their unique indexes exist once construction succeeds.
#[derive(Debug)]
pub struct SqliteServiceStore {
    /// Store connection guarded by a mutex.
    connection: Mutex<Connection>,
}

impl SqliteServiceStore {
    /// Opens (creating if needed) the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unusable or the database
    /// cannot be opened or initialized.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        debug!(path = %config.path.display(), "opened sqlite service store");
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Locks the connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))
    }

    /// Returns other rows on `key.url` validated on `date`, ordered by id.
    fn validated_siblings(
        &self,
        key: &ServiceKey,
        date: CalendarDay,
        limit: Option<u32>,
    ) -> Result<Vec<SiblingResult>, SqliteStoreError> {
        let connection = self.lock()?;
        let sql = format!(
            "SELECT id, url, {SNAPSHOT_COLUMNS} FROM services WHERE url = ?1 AND date = ?2 AND id \
             <> ?3 ORDER BY id LIMIT ?4"
        );
        let limit = limit.map_or(-1, i64::from);
        let mut statement = connection.prepare(&sql).map_err(db_error)?;
        let rows = statement
            .query_map(params![key.url, date.to_string(), key.id.as_str(), limit], |row| {
                let id: String = row.get(0)?;
                let url: String = row.get(1)?;
                Ok((ServiceKey::new(id, url), RawSnapshot::from_row(row, 2)?))
            })
            .map_err(db_error)?;
        let mut siblings = Vec::new();
        for row in rows {
            let (key, raw) = row.map_err(db_error)?;
            siblings.push(SiblingResult {
                key,
                snapshot: raw.into_snapshot()?,
            });
        }
        Ok(siblings)
    }
}

impl ServiceStore for SqliteServiceStore {
    fn service_exists(&self, key: &ServiceKey) -> Result<bool, StoreError> {
        let connection = self.lock()?;
        let found: Option<i64> = connection
            .query_row(
                "SELECT 1 FROM services WHERE id = ?1 AND url = ?2",
                params![key.id.as_str(), key.url],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;
        Ok(found.is_some())
    }

    fn insert_service(&self, key: &ServiceKey, date_insert: CalendarDay) -> Result<(), StoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                "INSERT INTO services (id, url, date_insert) VALUES (?1, ?2, ?3)",
                params![key.id.as_str(), key.url, date_insert.to_string()],
            )
            .map_err(db_error)?;
        Ok(())
    }

    fn refresh_metadata(&self, key: &ServiceKey, metadata: &ServiceMetadata) -> Result<(), StoreError> {
        let connection = self.lock()?;
        let changed = connection
            .execute(
                "UPDATE services SET date_update = ?1, vor_created = ?2, vor_updated = ?3, \
                 vor_status = ?4, provenance = ?5, standard_id = ?6, title = ?7, short_name = ?8, \
                 contact_name = ?9, contact_email = ?10, xsi_type = ?11, spec = ?12, specv = ?13, \
                 params = ?14 WHERE id = ?15 AND url = ?16",
                params![
                    metadata.date_update.to_string(),
                    metadata.vor_created,
                    metadata.vor_updated,
                    metadata.vor_status,
                    metadata.provenance,
                    metadata.standard_id,
                    metadata.title,
                    metadata.short_name,
                    metadata.contact_name,
                    metadata.contact_email,
                    metadata.xsi_type,
                    metadata.spec.as_str(),
                    metadata.specv,
                    metadata.params,
                    key.id.as_str(),
                    key.url,
                ],
            )
            .map_err(db_error)?;
        if changed == 0 {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(())
    }

    fn due_services(&self, min_update: CalendarDay) -> Result<Vec<DueService>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT id, url, spec, specv, params FROM services WHERE date_update >= ?1 ORDER \
                 BY id ASC, url ASC",
            )
            .map_err(db_error)?;
        let rows = statement
            .query_map(params![min_update.to_string()], |row| {
                let id: String = row.get(0)?;
                let url: String = row.get(1)?;
                let spec: Option<String> = row.get(2)?;
                let specv: Option<String> = row.get(3)?;
                let params: Option<String> = row.get(4)?;
                Ok(DueService {
                    key: ServiceKey::new(id, url),
                    spec: SpecName::new(spec.unwrap_or_default()),
                    specv: specv.unwrap_or_default(),
                    params: params.unwrap_or_default(),
                })
            })
            .map_err(db_error)?;
        let services = rows.collect::<Result<Vec<_>, _>>().map_err(db_error)?;
        Ok(services)
    }

    fn count_validated_siblings(&self, key: &ServiceKey, date: CalendarDay) -> Result<u64, StoreError> {
        let connection = self.lock()?;
        let count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM services WHERE url = ?1 AND date = ?2 AND id <> ?3",
                params![key.url, date.to_string(), key.id.as_str()],
                |row| row.get(0),
            )
            .map_err(db_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn first_validated_sibling(
        &self,
        key: &ServiceKey,
        date: CalendarDay,
    ) -> Result<Option<SiblingResult>, StoreError> {
        Ok(self.validated_siblings(key, date, Some(1))?.into_iter().next())
    }

    fn result_snapshot(&self, key: &ServiceKey) -> Result<Option<ResultSnapshot>, StoreError> {
        let connection = self.lock()?;
        let raw = connection
            .query_row(
                &format!("SELECT {SNAPSHOT_COLUMNS} FROM services WHERE id = ?1 AND url = ?2"),
                params![key.id.as_str(), key.url],
                |row| RawSnapshot::from_row(row, 0),
            )
            .optional()
            .map_err(db_error)?;
        Ok(raw.map(RawSnapshot::into_snapshot).transpose()?)
    }

    fn write_result(&self, key: &ServiceKey, result: &ResultWrite) -> Result<(), StoreError> {
        let connection = self.lock()?;
        let changed = connection
            .execute(
                "UPDATE services SET date = ?1, val_mode = ?2, result_vot = ?3, result_spec = ?4, \
                 nb_warn = ?5, nb_err = ?6, nb_fatal = ?7, nb_fail = ?8, days_same = ?9 WHERE id \
                 = ?10 AND url = ?11",
                params![
                    result.date.to_string(),
                    result.val_mode.map(ValidationMode::as_str),
                    result.result_vot,
                    result.result_spec,
                    result.counts.warnings,
                    result.counts.errors,
                    result.counts.fatals,
                    result.counts.failures,
                    result.days_same,
                    key.id.as_str(),
                    key.url,
                ],
            )
            .map_err(db_error)?;
        if changed == 0 {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(())
    }

    fn diagnostic_exists(&self, record: &DiagnosticRecord) -> Result<bool, StoreError> {
        let connection = self.lock()?;
        let found: Option<i64> = connection
            .query_row(
                "SELECT 1 FROM errors WHERE id = ?1 AND url = ?2 AND date = ?3 AND type = ?4 AND \
                 num = ?5 AND name = ?6 AND msg = ?7 AND section = ?8",
                params![
                    record.key.id.as_str(),
                    record.key.url,
                    record.date.to_string(),
                    record.kind.as_str(),
                    record.num,
                    record.entry.name,
                    record.entry.msg,
                    record.entry.section,
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;
        Ok(found.is_some())
    }

    fn insert_diagnostic(&self, record: &DiagnosticRecord) -> Result<(), StoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                "INSERT INTO errors (id, url, date, type, num, name, msg, section) VALUES (?1, \
                 ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.key.id.as_str(),
                    record.key.url,
                    record.date.to_string(),
                    record.kind.as_str(),
                    record.num,
                    record.entry.name,
                    record.entry.msg,
                    record.entry.section,
                ],
            )
            .map_err(db_error)?;
        Ok(())
    }

    fn diagnostics_for(
        &self,
        key: &ServiceKey,
        date: CalendarDay,
    ) -> Result<Vec<DiagnosticRecord>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT type, num, name, msg, section FROM errors WHERE id = ?1 AND url = ?2 AND \
                 date = ?3 ORDER BY type, num",
            )
            .map_err(db_error)?;
        let rows = statement
            .query_map(params![key.id.as_str(), key.url, date.to_string()], |row| {
                let kind: String = row.get(0)?;
                let num: i64 = row.get(1)?;
                let name: Option<String> = row.get(2)?;
                let msg: Option<String> = row.get(3)?;
                let section: Option<String> = row.get(4)?;
                Ok((kind, num, name, msg, section))
            })
            .map_err(db_error)?;
        let mut records = Vec::new();
        for row in rows {
            let (kind, num, name, msg, section) = row.map_err(db_error)?;
            let kind = kind.parse::<DiagnosticKind>().map_err(SqliteStoreError::Invalid)?;
            records.push(DiagnosticRecord {
                key: key.clone(),
                date,
                kind,
                num,
                entry: DiagnosticEntry::new(
                    name.unwrap_or_default(),
                    msg.unwrap_or_default(),
                    section.unwrap_or_default(),
                ),
            });
        }
        Ok(records)
    }

    fn service(&self, key: &ServiceKey) -> Result<Option<ServiceRow>, StoreError> {
        let connection = self.lock()?;
        let row = connection
            .query_row(
                &format!(
                    "SELECT title, short_name, date_insert, date_update, vor_status, vor_created, \
                     vor_updated, contact_name, contact_email, provenance, standard_id, \
                     xsi_type, spec, specv, params, {SNAPSHOT_COLUMNS} FROM services WHERE id = \
                     ?1 AND url = ?2"
                ),
                params![key.id.as_str(), key.url],
                |row| {
                    let metadata = RawMetadata {
                        title: row.get(0)?,
                        short_name: row.get(1)?,
                        date_insert: row.get(2)?,
                        date_update: row.get(3)?,
                        vor_status: row.get(4)?,
                        vor_created: row.get(5)?,
                        vor_updated: row.get(6)?,
                        contact_name: row.get(7)?,
                        contact_email: row.get(8)?,
                        provenance: row.get(9)?,
                        standard_id: row.get(10)?,
                        xsi_type: row.get(11)?,
                        spec: row.get(12)?,
                        specv: row.get(13)?,
                        params: row.get(14)?,
                    };
                    Ok((metadata, RawSnapshot::from_row(row, 15)?))
                },
            )
            .optional()
            .map_err(db_error)?;
        let Some((metadata, raw)) = row else {
            return Ok(None);
        };
        Ok(Some(ServiceRow {
            key: key.clone(),
            title: metadata.title,
            short_name: metadata.short_name,
            date_insert: metadata.date_insert,
            date_update: metadata.date_update,
            vor_status: metadata.vor_status,
            vor_created: metadata.vor_created,
            vor_updated: metadata.vor_updated,
            contact_name: metadata.contact_name,
            contact_email: metadata.contact_email,
            provenance: metadata.provenance,
            standard_id: metadata.standard_id,
            xsi_type: metadata.xsi_type,
            spec: metadata.spec,
            specv: metadata.specv,
            params: metadata.params,
            result: raw.into_snapshot()?,
        }))
    }
}

// ============================================================================
// SECTION: Opener
// ============================================================================

/// Opens one [`SqliteServiceStore`] connection per caller.
///
/// # Invariants
/// - The schema has been initialized once [`SqliteStoreOpener::new`] succeeds.
#[derive(Debug, Clone)]
pub struct SqliteStoreOpener {
    /// Store configuration shared by every connection.
    config: SqliteStoreConfig,
}

impl SqliteStoreOpener {
    /// Validates `config` and initializes the database.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        SqliteServiceStore::open(&config)?;
        Ok(Self {
            config,
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }
}

impl StoreOpener for SqliteStoreOpener {
    type Store = SqliteServiceStore;

    fn open(&self) -> Result<Self::Store, StoreError> {
        Ok(SqliteServiceStore::open(&self.config)?)
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Nullable metadata columns of a `services` row.
struct RawMetadata {
    /// `title`.
    title: Option<String>,
    /// `short_name`.
    short_name: Option<String>,
    /// `date_insert`.
    date_insert: Option<String>,
    /// `date_update`.
    date_update: Option<String>,
    /// `vor_status`.
    vor_status: Option<String>,
    /// `vor_created`.
    vor_created: Option<String>,
    /// `vor_updated`.
    vor_updated: Option<String>,
    /// `contact_name`.
    contact_name: Option<String>,
    /// `contact_email`.
    contact_email: Option<String>,
    /// `provenance`.
    provenance: Option<String>,
    /// `standard_id`.
    standard_id: Option<String>,
    /// `xsi_type`.
    xsi_type: Option<String>,
    /// `spec`.
    spec: Option<String>,
    /// `specv`.
    specv: Option<String>,
    /// `params`.
    params: Option<String>,
}

/// Nullable result columns as stored.
struct RawSnapshot {
    /// `val_mode`.
    val_mode: Option<String>,
    /// `result_vot`.
    result_vot: Option<String>,
    /// `result_spec`.
    result_spec: Option<String>,
    /// `nb_warn`, `nb_err`, `nb_fatal`, `nb_fail`.
    counts: [Option<i64>; 4],
    /// `date`.
    date: Option<String>,
    /// `days_same`.
    days_same: Option<i64>,
}

impl RawSnapshot {
    /// Reads [`SNAPSHOT_COLUMNS`] starting at column `offset`.
    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            val_mode: row.get(offset)?,
            result_vot: row.get(offset + 1)?,
            result_spec: row.get(offset + 2)?,
            counts: [
                row.get(offset + 3)?,
                row.get(offset + 4)?,
                row.get(offset + 5)?,
                row.get(offset + 6)?,
            ],
            date: row.get(offset + 7)?,
            days_same: row.get(offset + 8)?,
        })
    }

    /// Converts stored values, treating NULL counts and streaks as zero.
    fn into_snapshot(self) -> Result<ResultSnapshot, SqliteStoreError> {
        let val_mode = self
            .val_mode
            .map(|mode| mode.parse::<ValidationMode>())
            .transpose()
            .map_err(SqliteStoreError::Invalid)?;
        let [warnings, errors, fatals, failures] = self.counts;
        Ok(ResultSnapshot {
            val_mode,
            result_vot: self.result_vot.unwrap_or_default(),
            result_spec: self.result_spec.unwrap_or_default(),
            counts: ResultCounts {
                warnings: warnings.unwrap_or(0),
                errors: errors.unwrap_or(0),
                fatals: fatals.unwrap_or(0),
                failures: failures.unwrap_or(0),
            },
            date: self.date,
            days_same: self.days_same.unwrap_or(0),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies busy timeout, journal, and sync pragmas.
fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) -> Result<(), SqliteStoreError> {
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    Ok(())
}

/// Creates the tables and unique indexes when missing.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch(SCHEMA_SQL).map_err(db_error)?;
    tx.commit().map_err(db_error)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
