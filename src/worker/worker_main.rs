//! Worker process entry point and batch loop.
//!
//! Runs when `meshbatch worker <source> <dest>` is invoked by the supervisor.
//! Item identifiers arrive on stdin, one per line; the loop ends when the
//! supervisor closes the pipe.

use super::ipc::{LineReader, PipeFd};
use super::purge::PurgeCounter;
use super::report::WorkerReport;
use super::spawn::BATCH_INDEX_ENV;
use crate::engine::{ExportOptions, ObjTriangulator, ReclaimResources, Transform};
use crate::error::{MeshBatchError, Result};
use crate::jobs::JobItem;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

/// Per-worker settings taken from the worker command line.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub purge_frequency: u32,
    pub report_path: Option<PathBuf>,
}

/// Peak resident set size of this process in MiB.
fn peak_rss_mib() -> usize {
    use nix::sys::resource::{UsageWho, getrusage};

    match getrusage(UsageWho::RUSAGE_SELF) {
        Ok(usage) => {
            let max_rss = usage.max_rss() as usize;

            #[cfg(target_os = "macos")]
            {
                // macOS: bytes
                max_rss / (1024 * 1024)
            }

            #[cfg(not(target_os = "macos"))]
            {
                // Linux: kilobytes
                max_rss / 1024
            }
        }
        Err(_) => 0,
    }
}

/// Convert one item and count it toward the next reclamation.
///
/// A failed conversion is logged and recorded; it still counts as attempted.
fn process_item<E>(
    engine: &mut E,
    counter: PurgeCounter,
    item: &JobItem,
    settings: &WorkerSettings,
    report: &mut WorkerReport,
    progress: &mut impl Write,
) -> PurgeCounter
where
    E: Transform + ReclaimResources,
{
    let source = item.source_path(&settings.source_dir);
    let destination = item.destination_path(&settings.dest_dir);

    // Progress lines are for humans; a closed stdout must not stop the batch.
    let _ = writeln!(progress, "Processing {}", item);

    match engine.transform(&source, &destination) {
        Ok(stats) => {
            let _ = writeln!(
                progress,
                "Saved {} ({} faces -> {} triangles)",
                destination.display(),
                stats.faces_in,
                stats.triangles_out
            );
        }
        Err(e) => {
            let failure = MeshBatchError::TransformFailure {
                item: item.id().to_string(),
                message: e.to_string(),
            };
            warn!(item = %item, error = %e, "Conversion failed");
            let _ = writeln!(progress, "{}", failure);
            report.failed.push(item.id().to_string());
        }
    }
    report.attempted += 1;

    let step = counter.record_attempt();
    if step.is_reclaiming() {
        let freed = engine.reclaim();
        report.purges += 1;
        debug!(
            after_items = report.attempted,
            freed_blocks = freed,
            peak_rss_mib = peak_rss_mib(),
            "Reclaimed engine state"
        );
    }
    step.counter()
}

/// Run the batch loop until `reader` reaches end of input.
///
/// Blank lines are skipped. Returns the report for the whole batch.
pub fn run_batch<E, R>(
    engine: &mut E,
    reader: &mut LineReader<R>,
    settings: &WorkerSettings,
    progress: &mut impl Write,
) -> io::Result<WorkerReport>
where
    E: Transform + ReclaimResources,
    R: Read,
{
    let start = Instant::now();
    let mut report = WorkerReport::default();
    let mut counter = PurgeCounter::new(settings.purge_frequency);

    while let Some(line) = reader.read_line()? {
        if line.trim().is_empty() {
            continue;
        }
        let item = JobItem::new(line);
        counter = process_item(engine, counter, &item, settings, &mut report, progress);
    }

    debug!(
        retained_blocks = engine.retained(),
        until_next_purge = counter.remaining(),
        purge_frequency = counter.frequency(),
        "Input closed"
    );
    report.elapsed_ms = start.elapsed().as_millis() as u64;
    Ok(report)
}

fn run(settings: &WorkerSettings, export: ExportOptions) -> Result<WorkerReport> {
    let mut reader = LineReader::new(PipeFd::stdin()?);
    let mut engine = ObjTriangulator::new(export);
    let stdout = io::stdout();
    let mut progress = stdout.lock();

    let report = run_batch(&mut engine, &mut reader, settings, &mut progress)?;
    let _ = progress.flush();

    if let Some(path) = &settings.report_path {
        report.write_to(path)?;
    }
    Ok(report)
}

/// Run the worker process and exit.
///
/// Exits 0 once the whole input has been consumed, even if individual items
/// failed to convert; those are listed in the report. Exits 1 on I/O failure.
pub fn run_worker_main(settings: WorkerSettings, export: ExportOptions) -> ! {
    let batch = std::env::var(BATCH_INDEX_ENV).unwrap_or_else(|_| "-".to_string());
    let _span = info_span!("worker", batch = %batch, pid = std::process::id()).entered();

    info!(
        source = %settings.source_dir.display(),
        dest = %settings.dest_dir.display(),
        purge_frequency = settings.purge_frequency,
        "Worker started"
    );

    match run(&settings, export) {
        Ok(report) => {
            info!(
                attempted = report.attempted,
                converted = report.succeeded(),
                failed = report.failed.len(),
                purges = report.purges,
                elapsed_ms = report.elapsed_ms,
                "Worker finished"
            );
            std::process::exit(0)
        }
        Err(e) => {
            eprintln!("Worker error: {}", e);
            std::process::exit(1)
        }
    }
}
