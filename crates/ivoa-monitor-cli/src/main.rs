// crates/ivoa-monitor-cli/src/main.rs
// ============================================================================
// Module: IVOA Monitor CLI Entry Point
// Description: Command dispatcher for registry sync and validation runs.
// Purpose: Wire config, registry, store, and validator into the two commands.
// Dependencies: clap, ivoa-monitor-{core,config,providers,store-sqlite}, thiserror, time, tracing
// ============================================================================

//! ## Overview
//! `ivoa-monitor sync` harvests one service type from the registry into the
//! store. `ivoa-monitor validate` reconciles every service seen in the
//! registry today, fanning the work out to `--ps` workers that each hold
//! their own store connection.
//!
//! Exit codes: 0 on success, 1 for an invalid worker count or timeout
//! (negative and non-numeric values included), 2 for usage errors, 10 for fatal runtime conditions (no due services, store or
//! registry unavailable, unusable config or log file, failed workers).

// ============================================================================
// SECTION: Modules
// ============================================================================

mod logging;
#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use ivoa_monitor_config::MonitorConfig;
use ivoa_monitor_core::CalendarDay;
use ivoa_monitor_core::DispatchError;
use ivoa_monitor_core::Dispatcher;
use ivoa_monitor_core::DueService;
use ivoa_monitor_core::ReconcileSettings;
use ivoa_monitor_core::RegistrySync;
use ivoa_monitor_core::ServiceStore;
use ivoa_monitor_core::ServiceType;
use ivoa_monitor_core::SpecCatalog;
use ivoa_monitor_core::StoreOpener;
use ivoa_monitor_core::SyncReport;
use ivoa_monitor_core::WorkerReport;
use ivoa_monitor_providers::HttpValidatorClient;
use ivoa_monitor_providers::TapRegistryClient;
use ivoa_monitor_store_sqlite::SqliteStoreOpener;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::logging::init_logging;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Invalid worker count or timeout.
const EXIT_INVALID_ARGUMENT: u8 = 1;
/// Missing or malformed arguments, as reported by clap.
const EXIT_USAGE: u8 = 2;
/// Fatal runtime condition.
const EXIT_FATAL: u8 = 10;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "ivoa-monitor",
    version,
    about = "Track IVOA registry services and their validator results",
    disable_help_subcommand = true
)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Harvest services of one type from the registry into the store.
    Sync(SyncCommand),
    /// Validate every service seen in the registry today.
    Validate(ValidateCommand),
}

/// Options shared by both commands.
#[derive(Args, Debug)]
struct CommonArgs {
    /// Append log output to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Optional config file path (defaults to ivoa-monitor.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the `sync` command.
#[derive(Args, Debug)]
struct SyncCommand {
    /// Service type to harvest: `ConeSearch`, SIA, SSA, TAP, or SIAv2.
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_service_type)]
    service_type: ServiceType,
    /// `SQLite` database holding the services and errors tables.
    #[arg(long, value_name = "PATH")]
    db: PathBuf,
    /// Shared options.
    #[command(flatten)]
    common: CommonArgs,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// `SQLite` database holding the services and errors tables.
    #[arg(long, value_name = "PATH")]
    db: PathBuf,
    /// Number of parallel workers.
    #[arg(long = "ps", value_name = "N", default_value = "1", allow_negative_numbers = true)]
    workers: String,
    /// Validator request timeout in seconds (defaults to the configured value).
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    timeout: Option<String>,
    /// Shared options.
    #[command(flatten)]
    common: CommonArgs,
}

/// Parses a service type tag, case-insensitively.
fn parse_service_type(value: &str) -> Result<ServiceType, String> {
    value.parse::<ServiceType>().map_err(|err| err.to_string())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying the process exit code.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
    /// Exit code reported to the shell.
    code: u8,
}

impl CliError {
    /// Invalid worker count or timeout.
    const fn invalid_argument(message: String) -> Self {
        Self {
            message,
            code: EXIT_INVALID_ARGUMENT,
        }
    }

    /// Fatal runtime condition.
    const fn fatal(message: String) -> Self {
        Self {
            message,
            code: EXIT_FATAL,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return emit_clap_error(&err),
    };
    match run(cli, today()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => emit_error(&err),
    }
}

/// Executes the selected command.
fn run(cli: Cli, today: CalendarDay) -> CliResult<()> {
    match cli.command {
        Commands::Sync(command) => command_sync(&command, today),
        Commands::Validate(command) => command_validate(&command, today),
    }
}

/// Returns the current UTC calendar day.
fn today() -> CalendarDay {
    CalendarDay::new(OffsetDateTime::now_utc().date())
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs one registry sync pass.
fn command_sync(command: &SyncCommand, today: CalendarDay) -> CliResult<()> {
    let config = prepare(&command.common)?;
    let opener = open_store(&config, &command.db)?;
    let store = opener.open().map_err(|err| CliError::fatal(format!("cannot open store: {err}")))?;
    let registry = TapRegistryClient::new(config.registry.client_config())
        .map_err(|err| CliError::fatal(format!("cannot create registry client: {err}")))?;
    let catalog = SpecCatalog::with_endpoints(&config.validator.endpoints());

    let report = RegistrySync::new(&catalog, &registry, &store, today)
        .run(command.service_type)
        .map_err(|err| CliError::fatal(err.to_string()))?;

    for unknown in &report.unknown {
        warn!(service = %unknown.key, standard_id = %unknown.standard_id, "unknown specification");
        let _ = write_stderr_line(&format!(
            "unknown specification {} for {}",
            unknown.standard_id, unknown.key
        ));
    }
    if report.truncated {
        let _ = write_stderr_line(&format!(
            "registry answer for {} was truncated at its row limit; raise registry.max_records",
            report.service_type
        ));
    }
    write_stdout_line(&sync_summary(&report))
}

/// Runs the validation workers over today's due services.
fn command_validate(command: &ValidateCommand, today: CalendarDay) -> CliResult<()> {
    let config = prepare(&command.common)?;
    let timeout = resolve_timeout(command.timeout.as_deref(), config.validator.default_timeout())?;
    let opener = open_store(&config, &command.db)?;
    let due = due_services(&opener, today)?;
    if due.is_empty() {
        return Err(CliError::fatal(format!("no services updated on {today}; run sync first")));
    }
    let workers = resolve_worker_count(&command.workers, due.len())?;

    let mut settings = ReconcileSettings::new(today, timeout);
    settings.streak_policy = config.validator.streak_policy;
    settings.copy_sibling_diagnostics = config.validator.copy_sibling_diagnostics;
    let validator = HttpValidatorClient::new(config.validator.client_config())
        .map_err(|err| CliError::fatal(format!("cannot create validator client: {err}")))?;
    let catalog = SpecCatalog::with_endpoints(&config.validator.endpoints());
    info!(services = due.len(), workers, timeout_secs = timeout.as_secs(), "starting validation");

    let dispatcher = Dispatcher::new(Arc::new(catalog), Arc::new(opener), Arc::new(validator), settings);
    let handle = match dispatcher.dispatch(&due, workers) {
        Ok(handle) => handle,
        Err(
            err @ DispatchError::InvalidWorkerCount {
                ..
            },
        ) => return Err(CliError::invalid_argument(err.to_string())),
        Err(DispatchError::Spawn {
            message,
            started,
        }) => {
            for report in &started {
                write_stdout_line(&worker_summary(report))?;
            }
            return Err(CliError::fatal(format!("failed to start worker thread: {message}")));
        }
    };
    let reports = handle.join();

    let mut failed_workers = 0usize;
    for report in &reports {
        if let Some(failure) = &report.failure {
            error!(worker = report.worker, failure = %failure, "worker failed");
            failed_workers += 1;
        }
        write_stdout_line(&worker_summary(report))?;
    }
    if failed_workers > 0 {
        return Err(CliError::fatal(format!("{failed_workers} of {} workers failed", reports.len())));
    }
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads config and installs logging.
fn prepare(common: &CommonArgs) -> CliResult<MonitorConfig> {
    let config = MonitorConfig::load(common.config.as_deref()).map_err(|err| CliError::fatal(err.to_string()))?;
    init_logging(&config.logging.level, common.log.as_deref()).map_err(|err| CliError::fatal(err.to_string()))?;
    Ok(config)
}

/// Opens the store once, creating the schema if needed.
fn open_store(config: &MonitorConfig, db: &Path) -> CliResult<SqliteStoreOpener> {
    SqliteStoreOpener::new(config.store.store_config(db))
        .map_err(|err| CliError::fatal(format!("cannot open store {}: {err}", db.display())))
}

/// Lists services whose last registry sighting is today or later.
fn due_services(opener: &SqliteStoreOpener, today: CalendarDay) -> CliResult<Vec<DueService>> {
    let store = opener.open().map_err(|err| CliError::fatal(format!("cannot open store: {err}")))?;
    store.due_services(today).map_err(|err| CliError::fatal(format!("cannot list due services: {err}")))
}

/// Parses an integer flag value; anything else is an invalid argument.
fn parse_integer(flag: &str, raw: &str) -> CliResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| CliError::invalid_argument(format!("{flag} expects an integer, got '{raw}'")))
}

/// Applies the `--timeout` override; it must be at least one second.
fn resolve_timeout(raw: Option<&str>, default: Duration) -> CliResult<Duration> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let secs = parse_integer("--timeout", raw)?;
    match u64::try_from(secs) {
        Ok(secs) if secs >= 1 => Ok(Duration::from_secs(secs)),
        _ => Err(CliError::invalid_argument(format!("--timeout must be at least 1 second, got {secs}"))),
    }
}

/// Parses `--ps` and requires `1 <= workers <= due`.
fn resolve_worker_count(raw: &str, due: usize) -> CliResult<usize> {
    let workers = parse_integer("--ps", raw)?;
    match usize::try_from(workers) {
        Ok(workers) if (1 ..= due).contains(&workers) => Ok(workers),
        _ => Err(CliError::invalid_argument(format!(
            "--ps must be between 1 and {due} (services due today), got {workers}"
        ))),
    }
}

/// Formats the one-line sync summary.
fn sync_summary(report: &SyncReport) -> String {
    format!(
        "sync {}: fetched {}, inserted {}, refreshed {}, mismatched {}, unknown {}",
        report.service_type,
        report.fetched,
        report.inserted,
        report.refreshed,
        report.mismatched,
        report.unknown.len()
    )
}

/// Formats the one-line worker summary.
fn worker_summary(report: &WorkerReport) -> String {
    let line = format!(
        "worker {}: assigned {}, validated {}, copied {}, not updated {}, unsupported {}, failed {}",
        report.worker,
        report.assigned,
        report.validated,
        report.skipped_duplicate,
        report.not_updated,
        report.unsupported,
        report.failed
    );
    match &report.failure {
        Some(failure) => format!("{line} ({failure})"),
        None => line,
    }
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::fatal(format!("cannot write to stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Reports a CLI error and returns its exit code.
fn emit_error(err: &CliError) -> ExitCode {
    error!(code = err.code, "{}", err.message);
    let _ = write_stderr_line(&format!("ivoa-monitor: {err}"));
    ExitCode::from(err.code)
}

/// Prints a clap error (or help/version text) and returns clap's exit code.
fn emit_clap_error(err: &clap::Error) -> ExitCode {
    let _ = err.print();
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(EXIT_USAGE))
}
