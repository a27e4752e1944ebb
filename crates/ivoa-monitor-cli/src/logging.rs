// crates/ivoa-monitor-cli/src/logging.rs
// ============================================================================
// Module: CLI Logging
// Description: Tracing subscriber setup for the monitor binary.
// Purpose: Route library events to a log file or stderr with a level filter.
// Dependencies: thiserror, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! `RUST_LOG` takes precedence over the configured level. With `--log` the
//! events are appended to that file without ANSI colors; otherwise they go to
//! stderr.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be opened for appending.
    #[error("cannot open log file {0}")]
    Open(String),
    /// A global subscriber was already installed.
    #[error("cannot install log subscriber: {0}")]
    Install(String),
}

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`LoggingError`] when the log file cannot be opened or a
/// subscriber is already installed.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| LoggingError::Open(format!("{}: {err}", path.display())))?;
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false));
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|err| LoggingError::Install(err.to_string()))
        }
        None => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr));
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|err| LoggingError::Install(err.to_string()))
        }
    }
}
