// crates/ivoa-monitor-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and argument checks.
// Purpose: Pin the exit-code mapping of usage and argument errors.
// Dependencies: ivoa-monitor-cli main helpers
// ============================================================================

//! ## Overview
//! Parses argument vectors through clap and exercises the worker-count and
//! timeout checks that run before any worker starts.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::CommandFactory;
use clap::Parser;
use clap::error::ErrorKind;
use ivoa_monitor_core::ServiceType;
use ivoa_monitor_core::WorkerReport;

use super::Cli;
use super::Commands;
use super::EXIT_FATAL;
use super::EXIT_INVALID_ARGUMENT;
use super::EXIT_USAGE;
use super::resolve_timeout;
use super::resolve_worker_count;
use super::worker_summary;

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn validate_without_db_is_a_usage_error() {
    let err = Cli::try_parse_from(["ivoa-monitor", "validate"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    assert_eq!(err.exit_code(), i32::from(EXIT_USAGE));
}

#[test]
fn sync_requires_type() {
    let err = Cli::try_parse_from(["ivoa-monitor", "sync", "--db", "services.db"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

#[test]
fn sync_type_is_case_insensitive() {
    let cli = Cli::try_parse_from(["ivoa-monitor", "sync", "--type", "siav2", "--db", "services.db"]).unwrap();
    match cli.command {
        Commands::Sync(command) => {
            assert_eq!(command.service_type, ServiceType::SiaV2);
            assert_eq!(command.db, PathBuf::from("services.db"));
            assert!(command.common.log.is_none());
        }
        Commands::Validate(_) => panic!("expected sync"),
    }
}

#[test]
fn sync_unknown_type_is_a_usage_error() {
    let err = Cli::try_parse_from(["ivoa-monitor", "sync", "--type", "SLA", "--db", "services.db"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
    assert_eq!(err.exit_code(), i32::from(EXIT_USAGE));
}

#[test]
fn validate_defaults_to_one_worker_and_config_timeout() {
    let cli = Cli::try_parse_from(["ivoa-monitor", "validate", "--db", "services.db", "--log", "run.log"]).unwrap();
    match cli.command {
        Commands::Validate(command) => {
            assert_eq!(command.workers, "1");
            assert_eq!(command.timeout, None);
            assert_eq!(command.common.log, Some(PathBuf::from("run.log")));
        }
        Commands::Sync(_) => panic!("expected validate"),
    }
}

#[test]
fn negative_numbers_reach_the_argument_checks() {
    let cli = Cli::try_parse_from(["ivoa-monitor", "validate", "--db", "services.db", "--ps", "-1", "--timeout", "-3"])
        .unwrap();
    match cli.command {
        Commands::Validate(command) => {
            assert_eq!(command.workers, "-1");
            assert_eq!(command.timeout.as_deref(), Some("-3"));
            assert_eq!(resolve_worker_count(&command.workers, 5).unwrap_err().code, EXIT_INVALID_ARGUMENT);
            let err = resolve_timeout(command.timeout.as_deref(), Duration::from_secs(20)).unwrap_err();
            assert_eq!(err.code, EXIT_INVALID_ARGUMENT);
        }
        Commands::Sync(_) => panic!("expected validate"),
    }
}

// ============================================================================
// SECTION: Argument Checks
// ============================================================================

#[test]
fn timeout_override_and_default() {
    let default = Duration::from_secs(20);
    assert_eq!(resolve_timeout(None, default).unwrap(), default);
    assert_eq!(resolve_timeout(Some("3"), default).unwrap(), Duration::from_secs(3));
    let err = resolve_timeout(Some("0"), default).unwrap_err();
    assert_eq!(err.code, EXIT_INVALID_ARGUMENT);
    let err = resolve_timeout(Some("-3"), default).unwrap_err();
    assert_eq!(err.code, EXIT_INVALID_ARGUMENT);
    assert!(err.message.contains("at least 1 second"));
    let err = resolve_timeout(Some("soon"), default).unwrap_err();
    assert_eq!(err.code, EXIT_INVALID_ARGUMENT);
    assert!(err.message.contains("expects an integer"));
}

#[test]
fn worker_count_must_fit_due_services() {
    assert_eq!(resolve_worker_count("1", 1).unwrap(), 1);
    assert_eq!(resolve_worker_count("4", 10).unwrap(), 4);
    assert_eq!(resolve_worker_count("0", 10).unwrap_err().code, EXIT_INVALID_ARGUMENT);
    assert_eq!(resolve_worker_count("-2", 10).unwrap_err().code, EXIT_INVALID_ARGUMENT);
    assert_eq!(resolve_worker_count("two", 10).unwrap_err().code, EXIT_INVALID_ARGUMENT);
    let err = resolve_worker_count("3", 2).unwrap_err();
    assert_eq!(err.code, EXIT_INVALID_ARGUMENT);
    assert!(err.message.contains("between 1 and 2"));
}

#[test]
fn exit_codes_are_distinct() {
    assert_ne!(EXIT_INVALID_ARGUMENT, EXIT_USAGE);
    assert_eq!(EXIT_FATAL, 10);
}

// ============================================================================
// SECTION: Summaries
// ============================================================================

#[test]
fn worker_summary_mentions_failure() {
    let mut report = WorkerReport::new(2, 5);
    report.validated = 4;
    report.failed = 1;
    assert_eq!(
        worker_summary(&report),
        "worker 2: assigned 5, validated 4, copied 0, not updated 0, unsupported 0, failed 1"
    );
    report.failure = Some("store unavailable".to_string());
    assert!(worker_summary(&report).ends_with("failed 1 (store unavailable)"));
}
