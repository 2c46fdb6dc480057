//! Run summary rendering.

pub mod json;
pub mod plain;
pub mod table;

use crate::summary::RunSummary;
use std::time::Duration;

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Per-batch table (default).
    #[default]
    Table,
    /// JSON document.
    Json,
    /// Plain text (tab-separated, no colors).
    Plain,
}

/// Table display options.
#[derive(Debug, Clone, Copy)]
pub struct TableOptions {
    /// Use ASCII borders instead of Unicode.
    pub ascii: bool,
    /// Color status cells.
    pub color: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            ascii: false,
            color: true,
        }
    }
}

/// Render and print a run summary.
pub fn print_summary(summary: &RunSummary, format: OutputFormat, options: TableOptions) {
    let rendered = match format {
        OutputFormat::Table => table::render_table(summary, options),
        OutputFormat::Json => json::render_json(summary),
        OutputFormat::Plain => plain::render_plain(summary),
    };
    println!("{}", rendered);
}

/// Seconds with two decimals, as shown in every human-readable format.
pub(crate) fn format_secs(d: Duration) -> String {
    format!("{:.2}s", d.as_secs_f64())
}
