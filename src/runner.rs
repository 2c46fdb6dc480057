//! One run: every working directory, one after another.

use crate::config::RunConfig;
use crate::error::Result;
use crate::jobs::{JobSet, ensure_destination, partition};
use crate::summary::{DirectorySummary, RunSummary, aggregate};
use crate::worker::{WorkerLauncher, WorkerSupervisor};
use std::path::Path;
use std::time::Instant;
use tracing::{info, info_span};

/// Validate `config`, then convert every working directory.
///
/// Fails only on invalid configuration or when a directory cannot be listed
/// or its destination created. Worker failures end up in the summary.
pub fn run(config: RunConfig, launcher: &impl WorkerLauncher) -> Result<RunSummary> {
    config.validate()?;

    let mut directories = Vec::with_capacity(config.working_dirs.len());
    for working_dir in &config.working_dirs {
        directories.push(run_directory(&config, working_dir, launcher)?);
    }
    Ok(RunSummary::new(directories))
}

fn run_directory(
    config: &RunConfig,
    working_dir: &Path,
    launcher: &impl WorkerLauncher,
) -> Result<DirectorySummary> {
    let _span = info_span!("directory", path = %working_dir.display()).entered();
    let start = Instant::now();

    let destination = config.output.resolve(working_dir);
    let jobs = JobSet::scan(working_dir, &config.extension)?;
    let batches = partition(&jobs, config.worker_count)?;

    info!(
        jobs = jobs.len(),
        batches = batches.len(),
        destination = %destination.display(),
        "Starting directory"
    );

    ensure_destination(&destination)?;

    let outcomes = WorkerSupervisor::new(launcher, working_dir, &destination, config.purge_frequency)
        .run(&batches)?;

    let summary = aggregate(
        working_dir.to_path_buf(),
        destination,
        jobs.len(),
        &outcomes,
        start.elapsed(),
    );

    info!(
        processed = summary.totals.processed,
        failed_batches = summary.totals.failed_batches,
        wall_time_ms = summary.totals.wall_time.as_millis(),
        "Finished directory"
    );
    Ok(summary)
}
