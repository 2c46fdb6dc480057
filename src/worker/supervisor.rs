//! Spawns one worker per batch, feeds it, and joins on all of them.

use super::proc::WorkerHandle;
use super::report::WorkerReport;
use super::spawn::{LaunchRequest, WorkerLauncher};
use crate::error::{MeshBatchError, Result};
use crate::jobs::Batch;
use crate::summary::serialize_secs;
use serde::Serialize;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How a batch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BatchStatus {
    /// Worker consumed the whole batch and exited 0.
    Completed,
    /// Worker could not be started; no item was processed.
    SpawnFailed(String),
    /// Worker crashed, exited non-zero, or its input pipe broke.
    Failed(String),
}

/// Result of one batch, as seen by the supervisor.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerOutcome {
    pub batch: usize,
    pub items: usize,
    #[serde(flatten)]
    pub status: BatchStatus,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// The worker's own report, absent when it died before writing one.
    #[serde(skip)]
    pub report: Option<WorkerReport>,
}

impl WorkerOutcome {
    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Completed
    }

    /// Items known to have been attempted. Zero when the batch failed, since
    /// how far a dead worker got is unknown.
    pub fn processed(&self) -> usize {
        if self.is_success() { self.items } else { 0 }
    }

    /// Items known to have converted successfully.
    pub fn converted(&self) -> usize {
        if !self.is_success() {
            return 0;
        }
        self.items.saturating_sub(self.failed_items().len())
    }

    /// Identifiers whose conversion the worker reported as failed.
    pub fn failed_items(&self) -> &[String] {
        match &self.report {
            Some(report) if self.is_success() => &report.failed,
            _ => &[],
        }
    }

    /// Reclamations the worker reported, if it reported.
    pub fn purges(&self) -> Option<usize> {
        self.report.as_ref().map(|r| r.purges)
    }
}

/// Runs batches on isolated worker processes.
pub struct WorkerSupervisor<'a, L: WorkerLauncher> {
    launcher: &'a L,
    source_dir: &'a Path,
    dest_dir: &'a Path,
    purge_frequency: u32,
}

impl<'a, L: WorkerLauncher> WorkerSupervisor<'a, L> {
    pub fn new(launcher: &'a L, source_dir: &'a Path, dest_dir: &'a Path, purge_frequency: u32) -> Self {
        Self {
            launcher,
            source_dir,
            dest_dir,
            purge_frequency,
        }
    }

    /// Run every non-empty batch on its own worker and wait for all of them.
    ///
    /// Individual batch failures are reported in the outcomes; only failure to
    /// set up the shared report directory is an error.
    pub fn run(&self, batches: &[Batch]) -> Result<Vec<WorkerOutcome>> {
        let report_dir = tempfile::Builder::new()
            .prefix("meshbatch-reports-")
            .tempdir()?;

        let start = Instant::now();

        // Use scoped threads so each worker is fed independently
        let outcomes: Vec<WorkerOutcome> = thread::scope(|s| {
            let handles: Vec<_> = batches
                .iter()
                .filter(|batch| !batch.is_empty())
                .map(|batch| {
                    let report_path = report_dir.path().join(format!("batch-{}.json", batch.index));
                    let handle = s.spawn(move || self.drive(batch, &report_path));
                    (batch, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(batch, h)| {
                    h.join().unwrap_or_else(|_| WorkerOutcome {
                        batch: batch.index,
                        items: batch.len(),
                        status: BatchStatus::Failed("Supervisor thread panicked".into()),
                        elapsed: Duration::ZERO,
                        report: None,
                    })
                })
                .collect()
        });

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            workers = outcomes.len(),
            failed_batches = failed,
            elapsed_ms = start.elapsed().as_millis(),
            "All workers joined"
        );
        Ok(outcomes)
    }

    /// Launch, feed, close, and join the worker for one batch.
    fn drive(&self, batch: &Batch, report_path: &Path) -> WorkerOutcome {
        let start = Instant::now();
        let request = LaunchRequest {
            batch,
            source_dir: self.source_dir,
            dest_dir: self.dest_dir,
            purge_frequency: self.purge_frequency,
            report_path,
        };

        let status = match self.launcher.launch(&request) {
            Ok(mut handle) => {
                debug!(batch = batch.index, pid = %handle.pid(), items = batch.len(), "Worker spawned");
                self.feed_and_join(&mut handle, batch)
            }
            Err(e) => {
                warn!(batch = batch.index, error = %e, "Worker failed to start");
                BatchStatus::SpawnFailed(e.to_string())
            }
        };

        let report = match WorkerReport::read_from(report_path) {
            Ok(report) => report,
            Err(e) => {
                warn!(batch = batch.index, error = %e, "Unreadable worker report");
                None
            }
        };

        WorkerOutcome {
            batch: batch.index,
            items: batch.len(),
            status,
            elapsed: start.elapsed(),
            report,
        }
    }

    fn feed_and_join(&self, handle: &mut WorkerHandle, batch: &Batch) -> BatchStatus {
        let mut feed_error = None;
        for item in &batch.items {
            if let Err(e) = handle.send(item) {
                feed_error = Some(e);
                break;
            }
        }
        if feed_error.is_none()
            && let Err(e) = handle.close_input()
        {
            feed_error = Some(e);
        }

        let reason = match handle.wait() {
            Ok(reason) => reason,
            Err(e) => {
                warn!(batch = batch.index, error = %e, "Lost track of worker");
                return BatchStatus::Failed(e.to_string());
            }
        };

        if !reason.is_success() {
            let crash = MeshBatchError::WorkerCrash {
                batch: batch.index,
                reason: reason.description(),
            };
            warn!(batch = batch.index, reason = %reason, "Worker terminated abnormally");
            return BatchStatus::Failed(crash.to_string());
        }

        match feed_error {
            Some(e) => {
                warn!(batch = batch.index, error = %e, "Worker exited before taking its whole batch");
                BatchStatus::Failed(e.to_string())
            }
            None => {
                debug!(batch = batch.index, "Worker completed");
                BatchStatus::Completed
            }
        }
    }
}
