// crates/ivoa-monitor-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fixtures for ivoa-monitor-core tests.
// Purpose: Provide seeded stores, scripted validators, and fixed dates.
// Dependencies: ivoa-monitor-core, time
// ============================================================================

//! ## Overview
//! Provides shared helpers for reconciler, sync, and dispatch tests.

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
    dead_code,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::VecDeque;
use std::sync::Mutex;

use ivoa_monitor_core::CalendarDay;
use ivoa_monitor_core::DueService;
use ivoa_monitor_core::InMemoryServiceStore;
use ivoa_monitor_core::ResultSnapshot;
use ivoa_monitor_core::ServiceKey;
use ivoa_monitor_core::ServiceRow;
use ivoa_monitor_core::SpecName;
use ivoa_monitor_core::ValidatorClient;
use ivoa_monitor_core::ValidatorRequest;
use ivoa_monitor_core::ValidatorResponse;
use time::macros::date;

// ============================================================================
// SECTION: Dates
// ============================================================================

/// Fixed "today" used across tests.
pub const TODAY: CalendarDay = CalendarDay::new(date!(2018 - 04 - 10));

// ============================================================================
// SECTION: Store Fixtures
// ============================================================================

/// Seeds a row as a sync pass would leave it, with optional prior result.
pub fn seed_service(
    store: &InMemoryServiceStore,
    id: &str,
    url: &str,
    spec: &str,
    specv: &str,
    params: &str,
    result: ResultSnapshot,
) -> DueService {
    let key = ServiceKey::new(id, url);
    let mut row = ServiceRow::bare(key.clone(), CalendarDay::new(date!(2018 - 01 - 01)));
    row.date_update = Some(TODAY.to_string());
    row.spec = Some(spec.to_string());
    row.specv = Some(specv.to_string());
    row.params = Some(params.to_string());
    row.result = result;
    store.put_row(row).unwrap();
    DueService {
        key,
        spec: SpecName::new(spec),
        specv: specv.to_string(),
        params: params.to_string(),
    }
}

// ============================================================================
// SECTION: Validator Doubles
// ============================================================================

/// Validator returning queued responses and recording requests.
#[derive(Debug, Default)]
pub struct ScriptedValidator {
    /// Responses returned in order; an empty queue yields a request failure.
    responses: Mutex<VecDeque<ValidatorResponse>>,
    /// Requests received.
    calls: Mutex<Vec<ValidatorRequest>>,
}

impl ScriptedValidator {
    /// Creates a validator with queued responses.
    pub fn new(responses: Vec<ValidatorResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the requests received so far.
    pub fn calls(&self) -> Vec<ValidatorRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl ValidatorClient for ScriptedValidator {
    fn fetch(&self, request: &ValidatorRequest) -> ValidatorResponse {
        self.calls.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ValidatorResponse::RequestFailed("no scripted response".to_string()))
    }
}

/// Validator answering every call with the same body.
#[derive(Debug, Clone)]
pub struct FixedValidator {
    /// Body returned for every call.
    pub body: Vec<u8>,
}

impl ValidatorClient for FixedValidator {
    fn fetch(&self, _request: &ValidatorRequest) -> ValidatorResponse {
        ValidatorResponse::Body(self.body.clone())
    }
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Document-format payload with two warnings and one error.
pub const CONE_SEARCH_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<validation xmlns="http://voparis-validator.obspm.fr/">
  <valid spec="VOTable">yes</valid>
  <valid spec="Simple Cone Search">no</valid>
  <warning name="1.1"><div xmlns="http://www.w3.org/1999/xhtml">first</div></warning>
  <warning name="2.3"/>
  <error name="4.2"/>
</validation>
"#;

/// JSON-format payload with one warning, one error and one failure.
pub const TAP_REPORT: &str = r#"{
  "totals": {"WARNING": 1, "ERROR": 1, "FAILURE": 1, "INFO": 4},
  "sections": [
    {"code": "TMV", "reports": [
      {"level": "INFO", "code": "CONN", "text": "connected"},
      {"level": "WARNING", "code": "CPV7", "text": "column type mismatch"}
    ]},
    {"code": "QGE", "reports": [
      {"level": "ERROR", "code": "QGE2"},
      {"level": "FAILURE", "code": "QFA1", "text": "query failed"}
    ]}
  ]
}"#;
