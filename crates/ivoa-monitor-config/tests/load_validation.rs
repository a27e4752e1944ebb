//! Config load validation tests for ivoa-monitor-config.
// crates/ivoa-monitor-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards, defaults, and section checks.
// Purpose: Ensure config input handling is strict while every field stays optional.
// =============================================================================

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use ivoa_monitor_config::ConfigError;
use ivoa_monitor_config::MonitorConfig;
use ivoa_monitor_config::config_toml_example;
use ivoa_monitor_core::DEFAULT_DAL_VALIDATOR_URL;
use ivoa_monitor_core::StreakPolicy;
use ivoa_monitor_providers::DEFAULT_MAX_RECORDS;
use ivoa_monitor_store_sqlite::SqliteJournalMode;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<MonitorConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    Ok(file)
}

// ============================================================================
// SECTION: Load Guards
// ============================================================================

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(MonitorConfig::load(Some(path)), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(MonitorConfig::load(Some(path)), "config path component too long")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&vec![b'#'; 1_048_577])?;
    assert_invalid(MonitorConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_config(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(MonitorConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(MonitorConfig::load(Some(&path)), "config io error")?;
    Ok(())
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let file = write_config(b"[registry\nurl = 1")?;
    assert_invalid(MonitorConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let file = write_config(b"")?;
    let config = MonitorConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config != MonitorConfig::default() {
        return Err(format!("unexpected config: {config:?}"));
    }
    if config.validator.default_timeout() != Duration::from_secs(20) {
        return Err("default validator timeout should be 20 seconds".to_string());
    }
    if config.validator.endpoints().dal != DEFAULT_DAL_VALIDATOR_URL {
        return Err("default dal endpoint changed".to_string());
    }
    if config.registry.client_config().timeout_ms != 120_000 {
        return Err("default registry timeout should be 120 s".to_string());
    }
    if config.registry.client_config().max_records != DEFAULT_MAX_RECORDS {
        return Err("registry queries should send the default MAXREC".to_string());
    }
    Ok(())
}

#[test]
fn example_config_parses_and_validates() -> TestResult {
    let config = MonitorConfig::from_toml(&config_toml_example()).map_err(|err| err.to_string())?;
    if config.registry.max_records != 1_000_000 {
        return Err("example max_records not parsed".to_string());
    }
    if config.validator.streak_policy != StreakPolicy::Accumulate {
        return Err("example streak policy not parsed".to_string());
    }
    if config.store.journal_mode != SqliteJournalMode::Wal {
        return Err("example journal mode not parsed".to_string());
    }
    Ok(())
}

#[test]
fn overrides_flow_into_component_configs() -> TestResult {
    let config = MonitorConfig::from_toml(
        r#"
[validator]
default_timeout_secs = 45
copy_sibling_diagnostics = true
streak_policy = "reset_on_change"

[validator.base_urls]
tap = " https://tap-validator.example.org/check?format=JSON& "

[store]
journal_mode = "delete"
busy_timeout_ms = 1000
"#,
    )
    .map_err(|err| err.to_string())?;

    if config.validator.default_timeout() != Duration::from_secs(45) {
        return Err("timeout override ignored".to_string());
    }
    if config.validator.streak_policy != StreakPolicy::ResetOnChange || !config.validator.copy_sibling_diagnostics {
        return Err("reconcile overrides ignored".to_string());
    }
    let endpoints = config.validator.endpoints();
    if endpoints.tap != "https://tap-validator.example.org/check?format=JSON&" {
        return Err(format!("tap endpoint not trimmed: {}", endpoints.tap));
    }
    if endpoints.dal != DEFAULT_DAL_VALIDATOR_URL {
        return Err("dal endpoint should keep its default".to_string());
    }
    let store = config.store.store_config(Path::new("/var/lib/monitor/services.db"));
    if store.journal_mode != SqliteJournalMode::Delete || store.busy_timeout_ms != 1_000 {
        return Err("store overrides ignored".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Section Validation
// ============================================================================

#[test]
fn zero_timeouts_are_rejected() -> TestResult {
    assert_invalid(MonitorConfig::from_toml("[registry]\ntimeout_ms = 0\n"), "registry.timeout_ms")?;
    assert_invalid(
        MonitorConfig::from_toml("[validator]\ndefault_timeout_secs = 0\n"),
        "validator.default_timeout_secs",
    )?;
    assert_invalid(MonitorConfig::from_toml("[store]\nbusy_timeout_ms = 0\n"), "store.busy_timeout_ms")?;
    Ok(())
}

#[test]
fn empty_and_non_http_urls_are_rejected() -> TestResult {
    assert_invalid(MonitorConfig::from_toml("[registry]\nurl = \"  \"\n"), "registry.url must be non-empty")?;
    assert_invalid(
        MonitorConfig::from_toml("[registry]\nurl = \"ftp://rr.example.org/tap\"\n"),
        "registry.url must use http or https",
    )?;
    assert_invalid(
        MonitorConfig::from_toml("[validator.base_urls]\ndal = \"validator.php\"\n"),
        "validator.base_urls.dal is not a url",
    )?;
    Ok(())
}

#[test]
fn unknown_enum_values_and_levels_are_rejected() -> TestResult {
    assert_invalid(MonitorConfig::from_toml("[validator]\nstreak_policy = \"forever\"\n"), "config parse error")?;
    assert_invalid(MonitorConfig::from_toml("[logging]\nlevel = \"loud\"\n"), "logging.level")?;
    assert_invalid(MonitorConfig::from_toml("[registry]\nmax_records = 0\n"), "registry.max_records")?;
    Ok(())
}
