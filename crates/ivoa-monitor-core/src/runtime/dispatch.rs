// crates/ivoa-monitor-core/src/runtime/dispatch.rs
// ============================================================================
// Module: IVOA Monitor Parallel Dispatcher
// Description: Partition due services and reconcile them on worker threads.
// Purpose: Run validation concurrently with one exclusive store handle per worker.
// Dependencies: crate::{core, interfaces, runtime}, thiserror, tracing
// ============================================================================

//! ## Overview
//! Due services are split into N contiguous slices whose sizes differ by at
//! most one, earlier slices taking the extra element. Each slice runs on its
//! own OS thread, which opens its own store handle and reconciles its
//! services in order. [`DispatchHandle::join`] waits for every worker and
//! returns one [`WorkerReport`] per worker, including failed ones.
//!
//! # Invariants
//! - Slices are disjoint, so no two workers write the same `(id, url)` row.
//! - Only the catalog, settings, and validator client are shared; all are immutable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing::info_span;
use tracing::warn;

use crate::core::DueService;
use crate::core::SpecCatalog;
use crate::interfaces::StoreOpener;
use crate::interfaces::ValidatorClient;
use crate::runtime::reconciler::ReconcileOutcome;
use crate::runtime::reconciler::ReconcileSettings;
use crate::runtime::reconciler::Reconciler;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Dispatcher failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Worker count outside `1..=services`.
    #[error("invalid worker count {workers} for {services} services")]
    InvalidWorkerCount {
        /// Requested workers.
        workers: usize,
        /// Services to dispatch.
        services: usize,
    },
    /// A worker thread could not be started.
    #[error("failed to start worker thread: {message}")]
    Spawn {
        /// Spawn error message.
        message: String,
        /// Reports of the workers started before the failure, already joined.
        started: Vec<WorkerReport>,
    },
}

// ============================================================================
// SECTION: Partitioning
// ============================================================================

/// Splits `items` into `workers` contiguous slices whose sizes differ by at most one.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidWorkerCount`] unless `1 <= workers <= items.len()`.
pub fn partition<T>(items: &[T], workers: usize) -> Result<Vec<&[T]>, DispatchError> {
    if workers == 0 || workers > items.len() {
        return Err(DispatchError::InvalidWorkerCount {
            workers,
            services: items.len(),
        });
    }
    let base = items.len() / workers;
    let extra = items.len() % workers;
    let mut slices = Vec::with_capacity(workers);
    let mut start = 0;
    for index in 0 .. workers {
        let len = base + usize::from(index < extra);
        slices.push(&items[start .. start + len]);
        start += len;
    }
    Ok(slices)
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Per-worker counters returned by [`DispatchHandle::join`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker index, starting at 0.
    pub worker: usize,
    /// Services assigned to the worker.
    pub assigned: usize,
    /// Services whose result was copied from a sibling.
    pub skipped_duplicate: usize,
    /// Services validated and merged.
    pub validated: usize,
    /// Services left untouched after a non-200 status.
    pub not_updated: usize,
    /// Services whose specification has no validator.
    pub unsupported: usize,
    /// Services that failed with a store error.
    pub failed: usize,
    /// Worker-level failure (store unavailable, panic), if any.
    pub failure: Option<String>,
}

impl WorkerReport {
    /// Creates an empty report.
    #[must_use]
    pub const fn new(worker: usize, assigned: usize) -> Self {
        Self {
            worker,
            assigned,
            skipped_duplicate: 0,
            validated: 0,
            not_updated: 0,
            unsupported: 0,
            failed: 0,
            failure: None,
        }
    }

    /// Returns the number of services the worker got through.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.skipped_duplicate + self.validated + self.not_updated + self.unsupported + self.failed
    }

    /// Records one reconciliation outcome.
    fn record(&mut self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::SkippedDuplicate { .. } => self.skipped_duplicate += 1,
            ReconcileOutcome::Validated { .. } => self.validated += 1,
            ReconcileOutcome::NotUpdated { .. } => self.not_updated += 1,
            ReconcileOutcome::UnsupportedSpec => self.unsupported += 1,
        }
    }
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Fans due services out to worker threads.
pub struct Dispatcher<O, V> {
    /// Shared specification catalog.
    catalog: Arc<SpecCatalog>,
    /// Opens one store handle per worker.
    opener: Arc<O>,
    /// Shared validator client.
    validator: Arc<V>,
    /// Run settings.
    settings: ReconcileSettings,
}

impl<O, V> Dispatcher<O, V>
where
    O: StoreOpener + 'static,
    V: ValidatorClient + Send + Sync + 'static,
{
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(
        catalog: Arc<SpecCatalog>,
        opener: Arc<O>,
        validator: Arc<V>,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            catalog,
            opener,
            validator,
            settings,
        }
    }

    /// Starts `workers` threads over `services`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the worker count is invalid or a thread
    /// cannot be started. Workers already started are joined first and their
    /// reports travel in [`DispatchError::Spawn`].
    pub fn dispatch(&self, services: &[DueService], workers: usize) -> Result<DispatchHandle, DispatchError> {
        let slices = partition(services, workers)?;
        info!(services = services.len(), workers, "dispatching due services");
        let mut handles = Vec::with_capacity(slices.len());
        for (index, slice) in slices.into_iter().enumerate() {
            let slice = slice.to_vec();
            let catalog = Arc::clone(&self.catalog);
            let opener = Arc::clone(&self.opener);
            let validator = Arc::clone(&self.validator);
            let settings = self.settings;
            let spawned = thread::Builder::new()
                .name(format!("ivoa-monitor-worker-{index}"))
                .spawn(move || run_worker(index, &slice, &catalog, opener.as_ref(), validator.as_ref(), settings));
            match spawned {
                Ok(handle) => handles.push((index, handle)),
                Err(err) => {
                    let started = DispatchHandle {
                        workers: handles,
                    };
                    return Err(abandon_dispatch(started, err.to_string()));
                }
            }
        }
        Ok(DispatchHandle {
            workers: handles,
        })
    }
}

/// Joins the workers started before a spawn failure and keeps their reports.
fn abandon_dispatch(started: DispatchHandle, message: String) -> DispatchError {
    error!(error = %message, started = started.len(), "worker thread failed to start; joining started workers");
    let reports = started.join();
    for report in &reports {
        warn!(
            worker = report.worker,
            assigned = report.assigned,
            processed = report.processed(),
            failed = report.failed,
            failure = report.failure.as_deref().unwrap_or("none"),
            "worker joined after dispatch failure"
        );
    }
    DispatchError::Spawn {
        message,
        started: reports,
    }
}

/// Reconciles one slice sequentially on the current thread.
fn run_worker<O, V>(
    index: usize,
    services: &[DueService],
    catalog: &SpecCatalog,
    opener: &O,
    validator: &V,
    settings: ReconcileSettings,
) -> WorkerReport
where
    O: StoreOpener,
    V: ValidatorClient,
{
    let span = info_span!("worker", worker = index);
    let _entered = span.enter();
    let total = services.len();
    let mut report = WorkerReport::new(index, total);
    info!(services = total, "worker starting");

    let store = match opener.open() {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "worker could not open store");
            report.failure = Some(err.to_string());
            return report;
        }
    };
    let reconciler = Reconciler::new(catalog, &store, validator, settings);
    for (position, service) in services.iter().enumerate() {
        info!(service = %service.key, "processing service {}/{}", position + 1, total);
        match reconciler.reconcile(service) {
            Ok(outcome) => report.record(&outcome),
            Err(err) => {
                warn!(service = %service.key, error = %err, "service reconciliation failed; continuing");
                report.failed += 1;
            }
        }
    }
    info!(processed = report.processed(), "worker finished");
    report
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Running workers started by [`Dispatcher::dispatch`].
#[derive(Debug)]
pub struct DispatchHandle {
    /// Worker index and thread handle.
    workers: Vec<(usize, JoinHandle<WorkerReport>)>,
}

impl DispatchHandle {
    /// Returns the number of running workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Returns true when no worker was started.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Waits for every worker and returns their reports in worker order.
    ///
    /// A panicked worker yields a report carrying the failure.
    #[must_use]
    pub fn join(self) -> Vec<WorkerReport> {
        self.workers
            .into_iter()
            .map(|(index, handle)| {
                handle.join().unwrap_or_else(|_| {
                    error!(worker = index, "worker panicked");
                    WorkerReport {
                        failure: Some("worker panicked".to_string()),
                        ..WorkerReport::new(index, 0)
                    }
                })
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn abandoned_dispatch_keeps_reports_of_started_workers() {
        let workers = (0 .. 2)
            .map(|index| {
                let handle = thread::spawn(move || {
                    let mut report = WorkerReport::new(index, 3);
                    report.validated = 3;
                    report
                });
                (index, handle)
            })
            .collect();
        let started = DispatchHandle {
            workers,
        };

        let err = abandon_dispatch(started, "resource temporarily unavailable".to_string());

        let DispatchError::Spawn {
            message,
            started,
        } = err
        else {
            panic!("expected spawn error");
        };
        assert_eq!(message, "resource temporarily unavailable");
        assert_eq!(started.len(), 2);
        assert_eq!(started[1].worker, 1);
        assert_eq!(started[1].validated, 3);
        assert!(started.iter().all(|report| report.failure.is_none()));
    }
}
