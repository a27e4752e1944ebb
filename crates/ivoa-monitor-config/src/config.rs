// crates/ivoa-monitor-config/src/config.rs
// ============================================================================
// Module: IVOA Monitor Configuration
// Description: Configuration loading and validation for the monitor.
// Purpose: Provide strict config parsing with hard limits and defaults.
// Dependencies: ivoa-monitor-core, ivoa-monitor-providers, ivoa-monitor-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path
//! limits. Path resolution order:
//!
//! 1. the path passed by the caller (`--config`);
//! 2. the `IVOA_MONITOR_CONFIG` environment variable;
//! 3. `ivoa-monitor.toml` in the working directory, when it exists.
//!
//! When none applies, built-in defaults are used. Sections convert into the
//! configuration types of the crates they drive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use ivoa_monitor_core::StreakPolicy;
use ivoa_monitor_core::ValidatorEndpoints;
use ivoa_monitor_providers::DEFAULT_MAX_RECORDS;
use ivoa_monitor_providers::DEFAULT_REGISTRY_URL;
use ivoa_monitor_providers::HttpValidatorConfig;
use ivoa_monitor_providers::TapRegistryConfig;
use ivoa_monitor_store_sqlite::SqliteJournalMode;
use ivoa_monitor_store_sqlite::SqliteStoreConfig;
use ivoa_monitor_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "ivoa-monitor.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "IVOA_MONITOR_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default registry request timeout in milliseconds.
pub(crate) const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 120_000;
/// Default validator timeout in seconds.
pub(crate) const DEFAULT_VALIDATOR_TIMEOUT_SECS: u64 = 20;
/// Default store busy timeout in milliseconds.
pub(crate) const DEFAULT_BUSY_TIMEOUT_MS: u64 = 30_000;
/// Default maximum registry response size in bytes.
pub(crate) const DEFAULT_REGISTRY_MAX_BYTES: usize = 64 * 1024 * 1024;
/// Default maximum validator response size in bytes.
pub(crate) const DEFAULT_VALIDATOR_MAX_BYTES: usize = 16 * 1024 * 1024;
/// Log levels accepted in `[logging].level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// IVOA monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct MonitorConfig {
    /// Registry client configuration.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Validator client and reconciliation configuration.
    #[serde(default)]
    pub validator: ValidatorConfig,
    /// Service store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicitly named file cannot be read,
    /// or when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(resolved) = resolve_path(path)? else {
            return Ok(Self::default());
        };
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.registry.validate()?;
        self.validator.validate()?;
        self.store.validate()?;
        self.logging.validate()
    }
}

/// `[registry]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistryConfig {
    /// TAP base URL of the relational registry.
    #[serde(default = "default_registry_url")]
    pub url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_registry_timeout_ms")]
    pub timeout_ms: u64,
    /// `MAXREC` limit sent with registry queries.
    #[serde(default = "default_registry_max_records")]
    pub max_records: u32,
    /// User agent for registry requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum response size in bytes.
    #[serde(default = "default_registry_max_bytes")]
    pub max_response_bytes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            timeout_ms: DEFAULT_REGISTRY_TIMEOUT_MS,
            max_records: DEFAULT_MAX_RECORDS,
            user_agent: default_user_agent(),
            max_response_bytes: DEFAULT_REGISTRY_MAX_BYTES,
        }
    }
}

impl RegistryConfig {
    /// Validates the registry section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("registry.url", &self.url)?;
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("registry.timeout_ms must be greater than zero".to_string()));
        }
        if self.max_records == 0 {
            return Err(ConfigError::Invalid("registry.max_records must be greater than zero".to_string()));
        }
        if self.max_response_bytes == 0 {
            return Err(ConfigError::Invalid(
                "registry.max_response_bytes must be greater than zero".to_string(),
            ));
        }
        validate_user_agent("registry.user_agent", &self.user_agent)
    }

    /// Returns the registry client configuration.
    #[must_use]
    pub fn client_config(&self) -> TapRegistryConfig {
        TapRegistryConfig {
            url: self.url.trim().to_string(),
            timeout_ms: self.timeout_ms,
            max_records: self.max_records,
            user_agent: self.user_agent.clone(),
            max_response_bytes: self.max_response_bytes,
        }
    }
}

/// `[validator]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidatorConfig {
    /// Validator timeout used when `--timeout` is not given, in seconds.
    #[serde(default = "default_validator_timeout_secs")]
    pub default_timeout_secs: u64,
    /// User agent for validator requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum report size in bytes.
    #[serde(default = "default_validator_max_bytes")]
    pub max_response_bytes: usize,
    /// Copy a sibling's diagnostics along with its counts.
    #[serde(default)]
    pub copy_sibling_diagnostics: bool,
    /// Days-unchanged streak policy.
    #[serde(default)]
    pub streak_policy: StreakPolicy,
    /// Validator base URL overrides.
    #[serde(default)]
    pub base_urls: ValidatorBaseUrls,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_VALIDATOR_TIMEOUT_SECS,
            user_agent: default_user_agent(),
            max_response_bytes: DEFAULT_VALIDATOR_MAX_BYTES,
            copy_sibling_diagnostics: false,
            streak_policy: StreakPolicy::default(),
            base_urls: ValidatorBaseUrls::default(),
        }
    }
}

impl ValidatorConfig {
    /// Validates the validator section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "validator.default_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_response_bytes == 0 {
            return Err(ConfigError::Invalid(
                "validator.max_response_bytes must be greater than zero".to_string(),
            ));
        }
        validate_user_agent("validator.user_agent", &self.user_agent)?;
        if let Some(dal) = &self.base_urls.dal {
            validate_http_url("validator.base_urls.dal", dal)?;
        }
        if let Some(tap) = &self.base_urls.tap {
            validate_http_url("validator.base_urls.tap", tap)?;
        }
        Ok(())
    }

    /// Returns the default validator timeout.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Returns the validator endpoints with overrides applied.
    #[must_use]
    pub fn endpoints(&self) -> ValidatorEndpoints {
        let defaults = ValidatorEndpoints::default();
        ValidatorEndpoints {
            dal: self.base_urls.dal.as_deref().map_or(defaults.dal, |url| url.trim().to_string()),
            tap: self.base_urls.tap.as_deref().map_or(defaults.tap, |url| url.trim().to_string()),
        }
    }

    /// Returns the validator client configuration.
    #[must_use]
    pub fn client_config(&self) -> HttpValidatorConfig {
        HttpValidatorConfig {
            user_agent: self.user_agent.clone(),
            max_response_bytes: self.max_response_bytes,
        }
    }
}

/// `[validator.base_urls]` overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ValidatorBaseUrls {
    /// Document-format validator used for the DAL protocols.
    #[serde(default)]
    pub dal: Option<String>,
    /// JSON-format validator used for table access.
    #[serde(default)]
    pub tap: Option<String>,
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
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

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates the store section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid("store.busy_timeout_ms must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Returns the store configuration for the database at `path`.
    #[must_use]
    pub fn store_config(&self, path: &Path) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: path.to_path_buf(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Validates the logging section.
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Returns the default registry URL.
fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

/// Returns the default registry timeout.
const fn default_registry_timeout_ms() -> u64 {
    DEFAULT_REGISTRY_TIMEOUT_MS
}

/// Returns the default user agent.
fn default_user_agent() -> String {
    concat!("ivoa-monitor/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Returns the default registry `MAXREC`.
const fn default_registry_max_records() -> u32 {
    DEFAULT_MAX_RECORDS
}

/// Returns the default registry response size limit.
const fn default_registry_max_bytes() -> usize {
    DEFAULT_REGISTRY_MAX_BYTES
}

/// Returns the default validator timeout.
const fn default_validator_timeout_secs() -> u64 {
    DEFAULT_VALIDATOR_TIMEOUT_SECS
}

/// Returns the default validator response size limit.
const fn default_validator_max_bytes() -> usize {
    DEFAULT_VALIDATOR_MAX_BYTES
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default log level.
fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; `None` means defaults apply.
fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Requires a non-empty absolute http or https URL.
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    let url = Url::parse(trimmed).map_err(|err| ConfigError::Invalid(format!("{field} is not a url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!("{field} must use http or https")));
    }
    Ok(())
}

/// Requires a non-empty user agent.
fn validate_user_agent(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}
