// crates/ivoa-monitor-core/tests/reconciler_unit.rs
// ============================================================================
// Module: Reconciler Unit Tests
// Description: Validator call classification, sibling reuse, and result merging.
// Purpose: Ensure every validator outcome lands in the store exactly as recorded.
// Dependencies: ivoa-monitor-core, time
// ============================================================================

//! ## Overview
//! Exercises the reconciler against the in-memory store and scripted validators.

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

mod common;

use std::time::Duration;

use common::CONE_SEARCH_DOCUMENT;
use common::ScriptedValidator;
use common::TAP_REPORT;
use common::TODAY;
use common::seed_service;
use ivoa_monitor_core::DiagnosticKind;
use ivoa_monitor_core::DueService;
use ivoa_monitor_core::InMemoryServiceStore;
use ivoa_monitor_core::ReconcileError;
use ivoa_monitor_core::ReconcileOutcome;
use ivoa_monitor_core::ReconcileSettings;
use ivoa_monitor_core::Reconciler;
use ivoa_monitor_core::ResultCounts;
use ivoa_monitor_core::ResultSnapshot;
use ivoa_monitor_core::SPEC_CONE_SEARCH;
use ivoa_monitor_core::SPEC_LINE_ACCESS;
use ivoa_monitor_core::SPEC_TABLE_ACCESS;
use ivoa_monitor_core::ServiceKey;
use ivoa_monitor_core::ServiceStore;
use ivoa_monitor_core::SpecCatalog;
use ivoa_monitor_core::SpecName;
use ivoa_monitor_core::StreakPolicy;
use ivoa_monitor_core::ValidationMode;
use ivoa_monitor_core::ValidationSource;
use ivoa_monitor_core::ValidatorResponse;
use ivoa_monitor_core::build_validator_url;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const TAP_URL: &str = "http://tap.example.org/tap";
const CONE_URL: &str = "http://cone.example.org/scs?";
const CONE_PARAMS: &str = "RA=180.0&DEC=60.0&SR=0.1";

fn settings() -> ReconcileSettings {
    ReconcileSettings::new(TODAY, Duration::from_secs(20))
}

fn validated(date: &str, days_same: i64, warnings: i64) -> ResultSnapshot {
    ResultSnapshot {
        val_mode: Some(ValidationMode::Normal),
        result_vot: String::new(),
        result_spec: String::new(),
        counts: ResultCounts {
            warnings,
            errors: 0,
            fatals: 0,
            failures: 2,
        },
        date: Some(date.to_string()),
        days_same,
    }
}

fn seed_tap(store: &InMemoryServiceStore, id: &str, result: ResultSnapshot) -> DueService {
    seed_service(store, id, TAP_URL, SPEC_TABLE_ACCESS, "1.0", "", result)
}

fn seed_cone(store: &InMemoryServiceStore, result: ResultSnapshot) -> DueService {
    seed_service(store, "ivo://example/cone", CONE_URL, SPEC_CONE_SEARCH, "1.03", CONE_PARAMS, result)
}

// ============================================================================
// SECTION: Transport Classification
// ============================================================================

#[test]
fn tap_request_failure_records_minus_one_without_diagnostics() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let service = seed_tap(&store, "ivo://example/tap", ResultSnapshot::default());
    let validator = ScriptedValidator::new(vec![ValidatorResponse::RequestFailed("refused".to_string())]);
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    let outcome = reconciler.reconcile(&service).unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Validated { source: ValidationSource::RequestFailed, .. }));
    let row = store.result_snapshot(&service.key).unwrap().unwrap();
    assert_eq!(row.counts, ResultCounts::uniform(-1));
    assert_eq!(row.val_mode, Some(ValidationMode::Normal));
    assert_eq!(row.date.as_deref(), Some("2018-04-10"));
    assert_eq!(store.diagnostic_count().unwrap(), 0);
}

#[test]
fn timeout_records_minus_two() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let service = seed_cone(&store, ResultSnapshot::default());
    let validator = ScriptedValidator::new(vec![ValidatorResponse::TimedOut("read timed out".to_string())]);
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    let outcome = reconciler.reconcile(&service).unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Validated { source: ValidationSource::TimedOut, .. }));
    let row = store.result_snapshot(&service.key).unwrap().unwrap();
    assert_eq!(row.counts, ResultCounts::uniform(-2));
    assert_eq!(row.result_vot, "");
    assert_eq!(row.result_spec, "");
}

#[test]
fn body_read_failure_records_minus_one() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let service = seed_cone(&store, ResultSnapshot::default());
    let validator = ScriptedValidator::new(vec![ValidatorResponse::ReadFailed("connection reset".to_string())]);
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    let outcome = reconciler.reconcile(&service).unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Validated { source: ValidationSource::ReadFailed, .. }));
    assert_eq!(store.result_snapshot(&service.key).unwrap().unwrap().counts, ResultCounts::uniform(-1));
}

#[test]
fn non_200_status_leaves_row_untouched() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let previous = validated("2018-04-01", 3, 5);
    let service = seed_cone(&store, previous.clone());
    let validator = ScriptedValidator::new(vec![ValidatorResponse::HttpStatus(503)]);
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    let outcome = reconciler.reconcile(&service).unwrap();

    assert_eq!(outcome, ReconcileOutcome::NotUpdated { status: 503 });
    assert_eq!(store.result_snapshot(&service.key).unwrap().unwrap(), previous);
}

#[test]
fn line_access_has_no_validator() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let service =
        seed_service(&store, "ivo://example/sla", "http://sla.example.org/", SPEC_LINE_ACCESS, "1.0", "", ResultSnapshot::default());
    let validator = ScriptedValidator::new(Vec::new());
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    assert_eq!(reconciler.reconcile(&service).unwrap(), ReconcileOutcome::UnsupportedSpec);
    assert!(validator.calls().is_empty());
}

// ============================================================================
// SECTION: Sibling Reuse
// ============================================================================

#[test]
fn tap_sibling_validated_today_is_copied_without_validator_call() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let first = seed_tap(&store, "ivo://example/a", validated("2018-04-10", 7, 3));
    let second = seed_tap(&store, "ivo://example/b", validated("2018-04-02", 1, 0));
    let validator = ScriptedValidator::new(Vec::new());
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    let outcome = reconciler.reconcile(&second).unwrap();

    assert_eq!(outcome, ReconcileOutcome::SkippedDuplicate { sibling: first.key });
    assert!(validator.calls().is_empty());
    let row = store.result_snapshot(&second.key).unwrap().unwrap();
    assert_eq!(row.counts.warnings, 3);
    assert_eq!(row.counts.failures, 2);
    assert_eq!(row.days_same, 7);
    assert_eq!(row.date.as_deref(), Some("2018-04-10"));
    assert_eq!(row.val_mode, Some(ValidationMode::Normal));
    assert_eq!(store.diagnostic_count().unwrap(), 0);
}

#[test]
fn tap_row_validated_earlier_today_is_not_its_own_sibling() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let service = seed_tap(&store, "ivo://example/tap", validated("2018-04-10", 2, 1));
    let validator = ScriptedValidator::new(vec![ValidatorResponse::Body(TAP_REPORT.as_bytes().to_vec())]);
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    let outcome = reconciler.reconcile(&service).unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Validated { source: ValidationSource::Payload, .. }));
    assert_eq!(validator.calls().len(), 1);
}

#[test]
fn cone_search_sibling_does_not_share_results() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    seed_service(&store, "ivo://example/other", CONE_URL, SPEC_CONE_SEARCH, "1.03", CONE_PARAMS, validated("2018-04-10", 4, 9));
    let service = seed_cone(&store, ResultSnapshot::default());
    let validator = ScriptedValidator::new(vec![ValidatorResponse::Body(CONE_SEARCH_DOCUMENT.as_bytes().to_vec())]);
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    let outcome = reconciler.reconcile(&service).unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Validated { .. }));
    assert_eq!(validator.calls().len(), 1);
    assert_eq!(store.result_snapshot(&service.key).unwrap().unwrap().counts.warnings, 2);
}

#[test]
fn sibling_diagnostics_are_copied_when_enabled() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let first = seed_tap(&store, "ivo://example/a", ResultSnapshot::default());
    let second = seed_tap(&store, "ivo://example/b", ResultSnapshot::default());
    let validator = ScriptedValidator::new(vec![ValidatorResponse::Body(TAP_REPORT.as_bytes().to_vec())]);
    let settings = ReconcileSettings {
        copy_sibling_diagnostics: true,
        ..settings()
    };
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings);

    reconciler.reconcile(&first).unwrap();
    let outcome = reconciler.reconcile(&second).unwrap();

    assert!(matches!(outcome, ReconcileOutcome::SkippedDuplicate { .. }));
    let copied = store.diagnostics_for(&second.key, TODAY).unwrap();
    assert_eq!(copied.len(), 3);
    assert!(copied.iter().all(|record| record.key == second.key));
    assert_eq!(validator.calls().len(), 1);
}

// ============================================================================
// SECTION: Merge
// ============================================================================

#[test]
fn document_payload_merges_counts_flags_and_numbered_diagnostics() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let service = seed_cone(&store, validated("2018-04-07", 5, 2));
    let validator = ScriptedValidator::new(vec![ValidatorResponse::Body(CONE_SEARCH_DOCUMENT.as_bytes().to_vec())]);
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    reconciler.reconcile(&service).unwrap();

    let row = store.result_snapshot(&service.key).unwrap().unwrap();
    assert_eq!(row.result_vot, "yes");
    assert_eq!(row.result_spec, "no");
    assert_eq!(
        row.counts,
        ResultCounts {
            warnings: 2,
            errors: 1,
            fatals: 0,
            failures: 0
        }
    );
    assert_eq!(row.days_same, 8);

    let diagnostics = store.diagnostics_for(&service.key, TODAY).unwrap();
    let summary: Vec<(DiagnosticKind, i64, &str)> =
        diagnostics.iter().map(|record| (record.kind, record.num, record.entry.name.as_str())).collect();
    assert_eq!(
        summary,
        vec![(DiagnosticKind::Error, 1, "4.2"), (DiagnosticKind::Warning, 1, "1.1"), (DiagnosticKind::Warning, 2, "2.3")]
    );
}

#[test]
fn json_payload_keeps_section_codes_and_default_text() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let service = seed_tap(&store, "ivo://example/tap", ResultSnapshot::default());
    let validator = ScriptedValidator::new(vec![ValidatorResponse::Body(TAP_REPORT.as_bytes().to_vec())]);
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    reconciler.reconcile(&service).unwrap();

    let diagnostics = store.diagnostics_for(&service.key, TODAY).unwrap();
    let error = diagnostics.iter().find(|record| record.kind == DiagnosticKind::Error).unwrap();
    assert_eq!(error.entry.name, "QGE2");
    assert_eq!(error.entry.msg, "N/A");
    assert_eq!(error.entry.section, "QGE");
    let failure = diagnostics.iter().find(|record| record.kind == DiagnosticKind::Failure).unwrap();
    assert_eq!(failure.num, 1);
    assert_eq!(failure.entry.msg, "query failed");
}

#[test]
fn repeated_merge_on_same_day_does_not_duplicate_diagnostics() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let service = seed_cone(&store, ResultSnapshot::default());
    let body = CONE_SEARCH_DOCUMENT.as_bytes().to_vec();
    let validator =
        ScriptedValidator::new(vec![ValidatorResponse::Body(body.clone()), ValidatorResponse::Body(body)]);
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    reconciler.reconcile(&service).unwrap();
    reconciler.reconcile(&service).unwrap();

    assert_eq!(store.diagnostic_count().unwrap(), 3);
}

#[test]
fn colliding_diagnostic_is_skipped_and_merge_completes() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let service = seed_tap(&store, "ivo://example/tap", ResultSnapshot::default());
    let reworded = TAP_REPORT.replace("query failed", "query failed again");
    let validator = ScriptedValidator::new(vec![
        ValidatorResponse::Body(TAP_REPORT.as_bytes().to_vec()),
        ValidatorResponse::Body(reworded.into_bytes()),
    ]);
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());

    reconciler.reconcile(&service).unwrap();
    let second = reconciler.reconcile(&service).unwrap();

    assert!(matches!(second, ReconcileOutcome::Validated { .. }));
    assert_eq!(store.diagnostic_count().unwrap(), 3);
    let diagnostics = store.diagnostics_for(&service.key, TODAY).unwrap();
    let failure = diagnostics.iter().find(|record| record.kind == DiagnosticKind::Failure).unwrap();
    assert_eq!(failure.entry.msg, "query failed");
}

#[test]
fn reset_on_change_policy_restarts_streak_for_new_result() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let service = seed_cone(&store, validated("2018-04-07", 5, 2));
    let validator = ScriptedValidator::new(vec![ValidatorResponse::Body(CONE_SEARCH_DOCUMENT.as_bytes().to_vec())]);
    let settings = ReconcileSettings {
        streak_policy: StreakPolicy::ResetOnChange,
        ..settings()
    };
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings);

    reconciler.reconcile(&service).unwrap();

    assert_eq!(store.result_snapshot(&service.key).unwrap().unwrap().days_same, 0);
}

#[test]
fn merge_into_missing_row_is_not_found() {
    let catalog = SpecCatalog::builtin();
    let store = InMemoryServiceStore::new();
    let validator = ScriptedValidator::new(Vec::new());
    let reconciler = Reconciler::new(&catalog, &store, &validator, settings());
    let service = DueService {
        key: ServiceKey::new("ivo://example/gone", CONE_URL),
        spec: SpecName::new(SPEC_CONE_SEARCH),
        specv: "1.03".to_string(),
        params: CONE_PARAMS.to_string(),
    };

    let err = reconciler.reconcile(&service).unwrap_err();

    assert!(matches!(err, ReconcileError::NotFound(_)));
}

// ============================================================================
// SECTION: Request Building
// ============================================================================

#[test]
fn document_validator_url_appends_params_spec_and_service_url() {
    let catalog = SpecCatalog::builtin();
    let profile = catalog.profile(SPEC_CONE_SEARCH).unwrap();
    let service = DueService {
        key: ServiceKey::new("ivo://example/cone", CONE_URL),
        spec: SpecName::new(SPEC_CONE_SEARCH),
        specv: "1.03".to_string(),
        params: CONE_PARAMS.to_string(),
    };

    let url = build_validator_url(profile, &service, Duration::from_secs(20)).unwrap();

    assert_eq!(
        url,
        "http://voparis-validator.obspm.fr/validator.php?format=XML&RA=180.0&DEC=60.0&SR=0.1\
         &spec=Simple+Cone+Search+1.03&serviceURL=http%3A%2F%2Fcone.example.org%2Fscs%3F"
    );
}

#[test]
fn tap_validator_url_forwards_reduced_timeout_and_table_limit() {
    let catalog = SpecCatalog::builtin();
    let profile = catalog.profile(SPEC_TABLE_ACCESS).unwrap();
    let service = DueService {
        key: ServiceKey::new("ivo://example/tap", TAP_URL),
        spec: SpecName::new(SPEC_TABLE_ACCESS),
        specv: "1.0".to_string(),
        params: String::new(),
    };

    let url = build_validator_url(profile, &service, Duration::from_secs(20)).unwrap();
    assert_eq!(
        url,
        "http://voparis-validation.obspm.fr/tapvalidator.php?format=JSON&spec=Table+Access+Protocol+1.0\
         &serviceURL=http%3A%2F%2Ftap.example.org%2Ftap&timeout=19&maxtable=1"
    );

    let short = build_validator_url(profile, &service, Duration::from_secs(1)).unwrap();
    assert!(short.contains("&timeout=1&"));
}
