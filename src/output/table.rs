//! Table output for run summaries.

use super::{TableOptions, format_secs};
use crate::summary::{DirectorySummary, RunSummary};
use crate::worker::BatchStatus;
use comfy_table::{
    Cell, Color, ContentArrangement, Table,
    presets::{ASCII_FULL, UTF8_FULL},
};
use std::fmt::Write;

fn batch_table(dir: &DirectorySummary, options: TableOptions) -> Table {
    let mut table = Table::new();

    if options.ascii {
        table.load_preset(ASCII_FULL);
    } else {
        table.load_preset(UTF8_FULL);
    }
    if !options.color {
        table.force_no_tty();
    }
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Batch", "Items", "Processed", "Converted", "Purges", "Time", "Status"]);

    for batch in &dir.batches {
        let status = match &batch.status {
            BatchStatus::Completed if batch.failed_items.is_empty() => {
                Cell::new("completed").fg(Color::Green)
            }
            BatchStatus::Completed => Cell::new(format!(
                "completed, {} failed: {}",
                batch.failed_items.len(),
                batch.failed_items.join(", ")
            ))
            .fg(Color::Yellow),
            BatchStatus::SpawnFailed(reason) => {
                Cell::new(format!("spawn failed: {}", reason)).fg(Color::Red)
            }
            BatchStatus::Failed(reason) => Cell::new(reason).fg(Color::Red),
        };
        let purges = batch
            .purges
            .map_or_else(|| "-".to_string(), |p| p.to_string());

        table.add_row(vec![
            Cell::new(batch.batch),
            Cell::new(batch.items),
            Cell::new(batch.processed),
            Cell::new(batch.converted),
            Cell::new(purges),
            Cell::new(format_secs(batch.elapsed)),
            status,
        ]);
    }
    table
}

/// Render a run summary as one table per directory plus a totals line.
pub fn render_table(summary: &RunSummary, options: TableOptions) -> String {
    let mut out = String::new();

    for dir in &summary.directories {
        let _ = writeln!(out, "{} -> {}", dir.source.display(), dir.destination.display());
        if dir.batches.is_empty() {
            let _ = writeln!(out, "No items found.");
        } else {
            let _ = writeln!(out, "{}", batch_table(dir, options));
        }
        let t = &dir.totals;
        let _ = writeln!(
            out,
            "Processed {} of {} items with {} workers in {}\n",
            t.processed,
            t.jobs,
            t.workers_used,
            format_secs(t.wall_time)
        );
    }

    let t = &summary.totals;
    let _ = write!(
        out,
        "Total: {} processed, {} converted, {} failed items, {} failed batches, wall time {}, worker time {}",
        t.processed,
        t.converted,
        t.failed_items,
        t.failed_batches,
        format_secs(t.wall_time),
        format_secs(t.worker_time)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{BatchSummary, Totals};
    use std::path::PathBuf;
    use std::time::Duration;

    fn summary() -> RunSummary {
        let batch = BatchSummary {
            batch: 0,
            items: 4,
            processed: 4,
            converted: 3,
            status: BatchStatus::Completed,
            failed_items: vec!["broken.obj".into()],
            purges: Some(1),
            elapsed: Duration::from_millis(1200),
        };
        RunSummary::new(vec![DirectorySummary {
            source: PathBuf::from("/in"),
            destination: PathBuf::from("/out"),
            batches: vec![batch],
            totals: Totals {
                jobs: 4,
                workers_used: 1,
                processed: 4,
                converted: 3,
                failed_items: 1,
                ..Totals::default()
            },
        }])
    }

    #[test]
    fn test_render_table_with_batches() {
        let options = TableOptions {
            ascii: true,
            color: false,
        };
        let out = render_table(&summary(), options);
        assert!(out.contains("/in -> /out"));
        assert!(out.contains("broken.obj"));
        assert!(out.contains("1.20s"));
        assert!(out.contains("Total: 4 processed, 3 converted, 1 failed items"));
    }

    #[test]
    fn test_render_table_empty_directory() {
        let summary = RunSummary::new(vec![DirectorySummary {
            source: PathBuf::from("/in"),
            destination: PathBuf::from("/out"),
            batches: Vec::new(),
            totals: Totals::default(),
        }]);
        let out = render_table(&summary, TableOptions::default());
        assert!(out.contains("No items found."));
    }
}
