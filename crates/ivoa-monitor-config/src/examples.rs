// crates/ivoa-monitor-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and first-time setup.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for `ivoa-monitor.toml`. Every value shown is the
//! built-in default except the commented overrides.

/// Returns a canonical example `ivoa-monitor.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[registry]
url = "http://voparis-rr.obspm.fr/tap"
timeout_ms = 120000
max_records = 1000000
user_agent = "ivoa-monitor/0.1.0"

[validator]
default_timeout_secs = 20
copy_sibling_diagnostics = false
streak_policy = "accumulate"

[validator.base_urls]
# dal = "http://voparis-validator.obspm.fr/validator.php?format=XML&"
# tap = "http://voparis-validation.obspm.fr/tapvalidator.php?format=JSON&"

[store]
busy_timeout_ms = 30000
journal_mode = "wal"
sync_mode = "normal"

[logging]
level = "info"
"#,
    )
}
