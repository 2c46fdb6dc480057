//! Folding worker outcomes into per-directory and whole-run summaries.
//!
//! Everything here is pure; rendering lives in [`crate::output`].

use crate::worker::{BatchStatus, WorkerOutcome};
use serde::{Serialize, Serializer};
use std::ops::Add;
use std::path::PathBuf;
use std::time::Duration;

/// Serialize a duration as fractional seconds.
pub(crate) fn serialize_secs<S: Serializer>(
    d: &Duration,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// One batch as it appears in the summary.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub batch: usize,
    pub items: usize,
    pub processed: usize,
    pub converted: usize,
    #[serde(flatten)]
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purges: Option<usize>,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl From<&WorkerOutcome> for BatchSummary {
    fn from(outcome: &WorkerOutcome) -> Self {
        Self {
            batch: outcome.batch,
            items: outcome.items,
            processed: outcome.processed(),
            converted: outcome.converted(),
            status: outcome.status.clone(),
            failed_items: outcome.failed_items().to_vec(),
            purges: outcome.purges(),
            elapsed: outcome.elapsed,
        }
    }
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Completed
    }
}

/// Counters shared by the directory and run level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub jobs: usize,
    pub workers_used: usize,
    pub processed: usize,
    pub converted: usize,
    pub failed_items: usize,
    pub failed_batches: usize,
    /// Sum of per-worker elapsed time.
    #[serde(serialize_with = "serialize_secs")]
    pub worker_time: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub wall_time: Duration,
}

impl Add for Totals {
    type Output = Totals;

    fn add(self, other: Totals) -> Totals {
        Totals {
            jobs: self.jobs + other.jobs,
            workers_used: self.workers_used + other.workers_used,
            processed: self.processed + other.processed,
            converted: self.converted + other.converted,
            failed_items: self.failed_items + other.failed_items,
            failed_batches: self.failed_batches + other.failed_batches,
            worker_time: self.worker_time + other.worker_time,
            // Directories run one after another, so wall time adds up too.
            wall_time: self.wall_time + other.wall_time,
        }
    }
}

/// One working directory's pass.
#[derive(Debug, Clone, Serialize)]
pub struct DirectorySummary {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub batches: Vec<BatchSummary>,
    pub totals: Totals,
}

impl DirectorySummary {
    pub fn has_failures(&self) -> bool {
        self.totals.failed_batches > 0 || self.totals.failed_items > 0
    }
}

/// Fold one directory's outcomes into its summary.
pub fn aggregate(
    source: PathBuf,
    destination: PathBuf,
    jobs: usize,
    outcomes: &[WorkerOutcome],
    wall_time: Duration,
) -> DirectorySummary {
    let batches: Vec<BatchSummary> = outcomes.iter().map(BatchSummary::from).collect();

    let totals = batches.iter().fold(
        Totals {
            jobs,
            wall_time,
            ..Totals::default()
        },
        |acc, b| Totals {
            workers_used: acc.workers_used + usize::from(!matches!(b.status, BatchStatus::SpawnFailed(_))),
            processed: acc.processed + b.processed,
            converted: acc.converted + b.converted,
            failed_items: acc.failed_items + b.failed_items.len(),
            failed_batches: acc.failed_batches + usize::from(!b.is_success()),
            worker_time: acc.worker_time + b.elapsed,
            ..acc
        },
    );

    DirectorySummary {
        source,
        destination,
        batches,
        totals,
    }
}

/// Every directory of a run plus global totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub directories: Vec<DirectorySummary>,
    pub totals: Totals,
}

impl RunSummary {
    pub fn new(directories: Vec<DirectorySummary>) -> Self {
        let totals = directories
            .iter()
            .map(|d| d.totals)
            .fold(Totals::default(), Add::add);
        Self {
            directories,
            totals,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.directories.iter().any(DirectorySummary::has_failures)
    }
}
