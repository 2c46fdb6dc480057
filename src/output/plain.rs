//! Plain text output for run summaries.

use super::format_secs;
use crate::summary::{BatchSummary, RunSummary, Totals};
use crate::worker::BatchStatus;
use std::fmt::Write;

fn status_text(batch: &BatchSummary) -> String {
    match &batch.status {
        BatchStatus::Completed => "completed".to_string(),
        BatchStatus::SpawnFailed(reason) => format!("spawn failed: {}", reason),
        BatchStatus::Failed(reason) => format!("failed: {}", reason),
    }
}

fn totals_line(label: &str, totals: &Totals) -> String {
    format!(
        "{}: processed {} of {} items ({} converted) with {} workers in {} (worker time {})",
        label,
        totals.processed,
        totals.jobs,
        totals.converted,
        totals.workers_used,
        format_secs(totals.wall_time),
        format_secs(totals.worker_time)
    )
}

/// Render a run summary as plain text (tab-separated batch rows, no colors).
pub fn render_plain(summary: &RunSummary) -> String {
    let mut out = String::new();

    for dir in &summary.directories {
        let _ = writeln!(out, "{} -> {}", dir.source.display(), dir.destination.display());
        if dir.batches.is_empty() {
            let _ = writeln!(out, "No items found.");
        } else {
            let _ = writeln!(out, "BATCH\tITEMS\tPROCESSED\tCONVERTED\tTIME\tSTATUS");
        }
        for batch in &dir.batches {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                batch.batch,
                batch.items,
                batch.processed,
                batch.converted,
                format_secs(batch.elapsed),
                status_text(batch)
            );
            for item in &batch.failed_items {
                let _ = writeln!(out, "\tfailed item: {}", item);
            }
        }
        let _ = writeln!(out, "{}", totals_line("Directory", &dir.totals));
    }

    out.push_str(&totals_line("Total", &summary.totals));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::DirectorySummary;
    use std::path::PathBuf;
    use std::time::Duration;

    fn summary() -> RunSummary {
        let batch = BatchSummary {
            batch: 0,
            items: 3,
            processed: 0,
            converted: 0,
            status: BatchStatus::Failed("terminated by SIGKILL".into()),
            failed_items: Vec::new(),
            purges: None,
            elapsed: Duration::from_millis(500),
        };
        RunSummary::new(vec![DirectorySummary {
            source: PathBuf::from("/in"),
            destination: PathBuf::from("/in/triangulated"),
            batches: vec![batch],
            totals: Totals {
                jobs: 3,
                failed_batches: 1,
                ..Totals::default()
            },
        }])
    }

    #[test]
    fn test_render_plain_lists_batches() {
        let out = render_plain(&summary());
        assert!(out.contains("/in -> /in/triangulated"));
        assert!(out.contains("0\t3\t0\t0\t0.50s\tfailed: terminated by SIGKILL"));
        assert!(out.ends_with("Total: processed 0 of 3 items (0 converted) with 0 workers in 0.00s (worker time 0.00s)"));
    }

    #[test]
    fn test_render_plain_empty_run() {
        let out = render_plain(&RunSummary::default());
        assert!(out.starts_with("Total: processed 0 of 0 items"));
    }
}
