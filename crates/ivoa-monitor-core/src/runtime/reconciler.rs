// crates/ivoa-monitor-core/src/runtime/reconciler.rs
// ============================================================================
// Module: IVOA Monitor Validation Reconciler
// Description: Per-service validation, sibling reuse, and result merging.
// Purpose: Turn one due service into an updated `services` row and `errors` rows.
// Dependencies: crate::{core, interfaces, runtime}, thiserror, tracing, url
// ============================================================================

//! ## Overview
//! For each due service the reconciler either reuses a result recorded today
//! for another service at the same URL (only for specifications that share
//! results by URL), or calls the validator and merges what comes back.
//!
//! State machine per service: `PENDING` moves to exactly one of
//! [`ReconcileOutcome::SkippedDuplicate`], [`ReconcileOutcome::Validated`],
//! [`ReconcileOutcome::NotUpdated`] or [`ReconcileOutcome::UnsupportedSpec`].
//!
//! # Invariants
//! - A non-200 validator status never touches the store.
//! - Transport failures are merged as sentinel outcomes, never dropped.
//! - Diagnostic sequence numbers restart at 1 for each category.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use url::form_urlencoded;

use crate::core::CalendarDay;
use crate::core::DiagnosticKind;
use crate::core::DiagnosticRecord;
use crate::core::DueService;
use crate::core::ResultWrite;
use crate::core::ServiceKey;
use crate::core::SiblingResult;
use crate::core::SpecCatalog;
use crate::core::ValidationMode;
use crate::core::ValidationOutcome;
use crate::core::ValidatorProfile;
use crate::interfaces::ServiceStore;
use crate::interfaces::StoreError;
use crate::interfaces::ValidatorClient;
use crate::interfaces::ValidatorRequest;
use crate::interfaces::ValidatorResponse;
use crate::runtime::streak::StreakPolicy;
use crate::runtime::streak::next_days_same;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Inputs shared by every reconciliation in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSettings {
    /// Calendar day recorded as the validation date.
    pub today: CalendarDay,
    /// Timeout for each validator call.
    pub timeout: Duration,
    /// Streak policy applied on merge.
    pub streak_policy: StreakPolicy,
    /// Copy a sibling's diagnostics along with its result.
    pub copy_sibling_diagnostics: bool,
}

impl ReconcileSettings {
    /// Creates settings with default policies.
    #[must_use]
    pub const fn new(today: CalendarDay, timeout: Duration) -> Self {
        Self {
            today,
            timeout,
            streak_policy: StreakPolicy::Accumulate,
            copy_sibling_diagnostics: false,
        }
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Where a merged validation outcome came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSource {
    /// Decoded validator payload (possibly the unreadable sentinel).
    Payload,
    /// Request failed before a status was received.
    RequestFailed,
    /// Request timed out.
    TimedOut,
    /// Body could not be read after a 200 status.
    ReadFailed,
}

/// Terminal state of one service reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Result copied from a sibling validated today.
    SkippedDuplicate {
        /// Sibling the result was copied from.
        sibling: ServiceKey,
    },
    /// Validator called and its outcome merged.
    Validated {
        /// Origin of the merged outcome.
        source: ValidationSource,
        /// Merged outcome.
        outcome: ValidationOutcome,
    },
    /// Validator answered with a non-200 status; nothing written.
    NotUpdated {
        /// Status received.
        status: u16,
    },
    /// No validator is configured for the service's specification.
    UnsupportedSpec,
}

/// Reconciliation failures.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The service row disappeared before merging.
    #[error("service row not found: {0}")]
    NotFound(String),
    /// The store reported an error.
    #[error("reconcile store error: {0}")]
    Store(String),
}

impl From<StoreError> for ReconcileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => Self::NotFound(message),
            other => Self::Store(other.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Request Building
// ============================================================================

/// Builds the validator URL for a service.
///
/// The URL is the profile base URL, the stored parameters, then the
/// form-encoded `spec`, `serviceURL` and, when the profile forwards it,
/// `timeout` (one second less than the call timeout, at least 1) and
/// `maxtable`. Returns `None` when the profile has no validator.
#[must_use]
pub fn build_validator_url(profile: &ValidatorProfile, service: &DueService, timeout: Duration) -> Option<String> {
    let base = profile.base_url.as_deref()?;
    let mut url = String::from(base);
    append_separator(&mut url);
    url.push_str(&service.params);
    append_separator(&mut url);

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("spec", &format!("{} {}", service.spec, service.specv));
    query.append_pair("serviceURL", &service.key.url);
    if profile.forward_timeout {
        let forwarded = timeout.as_secs().saturating_sub(1).max(1);
        query.append_pair("timeout", &forwarded.to_string());
    }
    if let Some(max_tables) = profile.max_tables {
        query.append_pair("maxtable", &max_tables.to_string());
    }
    url.push_str(&query.finish());
    Some(url)
}

/// Appends `&` unless the URL already ends in a query separator.
fn append_separator(url: &mut String) {
    if !url.ends_with('&') && !url.ends_with('?') {
        url.push('&');
    }
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Reconciles due services against one store and one validator client.
pub struct Reconciler<'a, S, V> {
    /// Specification catalog.
    catalog: &'a SpecCatalog,
    /// Store handle owned by the current worker.
    store: &'a S,
    /// Validator client.
    validator: &'a V,
    /// Run settings.
    settings: ReconcileSettings,
}

impl<'a, S, V> Reconciler<'a, S, V>
where
    S: ServiceStore,
    V: ValidatorClient,
{
    /// Creates a reconciler.
    #[must_use]
    pub const fn new(catalog: &'a SpecCatalog, store: &'a S, validator: &'a V, settings: ReconcileSettings) -> Self {
        Self {
            catalog,
            store,
            validator,
            settings,
        }
    }

    /// Returns the run settings.
    #[must_use]
    pub const fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    /// Reconciles one due service.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the store fails; validator failures are
    /// merged as sentinel outcomes instead.
    pub fn reconcile(&self, service: &DueService) -> Result<ReconcileOutcome, ReconcileError> {
        let key = &service.key;
        info!(service = %key, spec = %service.spec, specv = %service.specv, "processing service");

        let Some(profile) = self.catalog.profile(service.spec.as_str()) else {
            warn!(service = %key, spec = %service.spec, "no validator profile for specification");
            return Ok(ReconcileOutcome::UnsupportedSpec);
        };

        let siblings = self.store.count_validated_siblings(key, self.settings.today)?;
        debug!(service = %key, siblings, "services with same url validated today");
        if profile.shares_results_by_url && siblings > 0 {
            if let Some(sibling) = self.store.first_validated_sibling(key, self.settings.today)? {
                self.copy_sibling(key, &sibling)?;
                return Ok(ReconcileOutcome::SkippedDuplicate { sibling: sibling.key });
            }
        }

        let Some(url) = build_validator_url(profile, service, self.settings.timeout) else {
            warn!(service = %key, spec = %service.spec, "no validator endpoint for specification");
            return Ok(ReconcileOutcome::UnsupportedSpec);
        };
        info!(service = %key, url = %url, timeout_secs = self.settings.timeout.as_secs(), "calling validator");

        let request = ValidatorRequest {
            url,
            timeout: self.settings.timeout,
        };
        let (source, outcome) = match self.validator.fetch(&request) {
            ValidatorResponse::Body(body) => {
                (ValidationSource::Payload, profile.format.decode(service.spec.as_str(), &body))
            }
            ValidatorResponse::HttpStatus(status) => {
                error!(service = %key, status, "validator returned non-200 status; giving up");
                return Ok(ReconcileOutcome::NotUpdated { status });
            }
            ValidatorResponse::RequestFailed(message) => {
                error!(service = %key, error = %message, "validator request failed; recording -1");
                (ValidationSource::RequestFailed, ValidationOutcome::unreadable())
            }
            ValidatorResponse::TimedOut(message) => {
                error!(service = %key, error = %message, "validator request timed out; recording -2");
                (ValidationSource::TimedOut, ValidationOutcome::timed_out())
            }
            ValidatorResponse::ReadFailed(message) => {
                error!(service = %key, error = %message, "validator body unreadable; recording -1");
                (ValidationSource::ReadFailed, ValidationOutcome::unreadable())
            }
        };
        self.update_service(key, &outcome)?;
        Ok(ReconcileOutcome::Validated { source, outcome })
    }

    /// Merges a validation outcome into the service row and its diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::NotFound`] when the row does not exist.
    pub fn update_service(&self, key: &ServiceKey, outcome: &ValidationOutcome) -> Result<(), ReconcileError> {
        let today = self.settings.today;
        let previous = self
            .store
            .result_snapshot(key)?
            .ok_or_else(|| ReconcileError::NotFound(key.to_string()))?;
        let days_same = next_days_same(self.settings.streak_policy, &previous, outcome, today);
        debug!(service = %key, previous = previous.days_same, days_same, "computed days unchanged");

        self.store.write_result(
            key,
            &ResultWrite {
                date: today,
                val_mode: Some(ValidationMode::Normal),
                result_vot: outcome.result_vot.clone(),
                result_spec: outcome.result_spec.clone(),
                counts: outcome.counts,
                days_same,
            },
        )?;

        for kind in DiagnosticKind::ALL {
            for (num, entry) in (1_i64 ..).zip(outcome.diagnostics(kind)) {
                let record = DiagnosticRecord {
                    key: key.clone(),
                    date: today,
                    kind,
                    num,
                    entry: entry.clone(),
                };
                if let Err(err) = self.upsert_diagnostic(&record) {
                    warn!(service = %key, kind = %kind, num, error = %err, "diagnostic not recorded");
                }
            }
        }
        Ok(())
    }

    /// Copies a sibling's validation columns onto `key`.
    fn copy_sibling(&self, key: &ServiceKey, sibling: &SiblingResult) -> Result<(), ReconcileError> {
        info!(service = %key, sibling = %sibling.key, "reusing result of service with same url validated today");
        let snapshot = &sibling.snapshot;
        self.store.write_result(
            key,
            &ResultWrite {
                date: self.settings.today,
                val_mode: snapshot.val_mode,
                result_vot: snapshot.result_vot.clone(),
                result_spec: snapshot.result_spec.clone(),
                counts: snapshot.counts,
                days_same: snapshot.days_same,
            },
        )?;
        if self.settings.copy_sibling_diagnostics {
            for record in self.store.diagnostics_for(&sibling.key, self.settings.today)? {
                self.upsert_diagnostic(&DiagnosticRecord {
                    key: key.clone(),
                    ..record
                })?;
            }
        }
        Ok(())
    }

    /// Inserts a diagnostic unless an identical row exists.
    fn upsert_diagnostic(&self, record: &DiagnosticRecord) -> Result<(), ReconcileError> {
        if self.store.diagnostic_exists(record)? {
            debug!(service = %record.key, kind = %record.kind, num = record.num, "diagnostic already recorded");
            return Ok(());
        }
        self.store.insert_diagnostic(record)?;
        Ok(())
    }
}
