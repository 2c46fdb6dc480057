//! Command-line interface definitions using clap.

use crate::config::{DEFAULT_EXTENSION, DEFAULT_PURGE_FREQUENCY, OutputFolder, RunConfig};
use crate::engine::ExportOptions;
use crate::logging::LogFormat;
use crate::output::{OutputFormat, TableOptions};
use crate::paths;
use crate::worker::WorkerSettings;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Batch-triangulate mesh files across a pool of worker processes.
#[derive(Parser, Debug)]
#[command(name = "meshbatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, env = "NO_COLOR", global = true)]
    pub no_color: bool,

    /// Log format on stderr.
    #[arg(long, env = "MESHBATCH_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Also write logs to this file.
    #[arg(long, env = "MESHBATCH_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Triangulate every mesh in one or more directories.
    Run(RunArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),

    /// Process one batch read from stdin (spawned by `run`).
    #[command(hide = true)]
    Worker(WorkerArgs),
}

/// Arguments for shell completions.
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate and print completions to stdout.
    pub fn generate(&self) {
        clap_complete::generate(
            self.shell,
            &mut Cli::command(),
            "meshbatch",
            &mut std::io::stdout(),
        );
    }
}

/// Attribute switches shared by `run` and `worker`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ExportArgs {
    /// Keep vertex normals in the output.
    #[arg(long)]
    pub keep_normals: bool,

    /// Keep material libraries and assignments in the output.
    #[arg(long)]
    pub keep_materials: bool,

    /// Drop texture coordinates from the output.
    #[arg(long)]
    pub no_uvs: bool,
}

impl From<ExportArgs> for ExportOptions {
    fn from(args: ExportArgs) -> Self {
        ExportOptions {
            keep_uvs: !args.no_uvs,
            keep_normals: args.keep_normals,
            keep_materials: args.keep_materials,
        }
    }
}

/// Arguments for the run command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directories containing the meshes to convert.
    #[arg(required = true)]
    pub working_dirs: Vec<PathBuf>,

    /// Output folder: absolute path, or subfolder of each working directory.
    #[arg(short, long, env = "MESHBATCH_OUTPUT", default_value = "triangulated")]
    pub output: PathBuf,

    /// Number of worker processes [default: half the available cores].
    #[arg(short = 'j', long, env = "MESHBATCH_WORKERS")]
    pub workers: Option<usize>,

    /// Items each worker converts between engine purges.
    #[arg(short, long, env = "MESHBATCH_PURGE_FREQUENCY", default_value_t = DEFAULT_PURGE_FREQUENCY)]
    pub purge_frequency: u32,

    /// File extension selecting the meshes to convert.
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    pub extension: String,

    #[command(flatten)]
    pub export: ExportArgs,

    /// Summary format.
    #[arg(short, long, value_enum, default_value_t = OutputFormatArg::Table)]
    pub format: OutputFormatArg,

    /// Use ASCII table borders instead of Unicode.
    #[arg(long)]
    pub ascii: bool,
}

impl RunArgs {
    /// Build the immutable run configuration. Range checks happen in
    /// [`RunConfig::validate`].
    pub fn to_config(&self) -> RunConfig {
        let working_dirs = self.working_dirs.iter().map(paths::resolve_dir).collect();
        let output = OutputFolder::from_path(paths::expand_tilde(&self.output));

        let mut config = RunConfig::new(working_dirs, output)
            .with_purge_frequency(self.purge_frequency)
            .with_extension(&self.extension)
            .with_export(self.export.into());
        if let Some(workers) = self.workers {
            config = config.with_worker_count(workers);
        }
        config
    }

    pub fn table_options(&self, color: bool) -> TableOptions {
        TableOptions {
            ascii: self.ascii,
            color,
        }
    }
}

/// Arguments for the hidden worker command.
#[derive(Parser, Debug)]
pub struct WorkerArgs {
    /// Directory the item names are relative to.
    pub source_dir: PathBuf,

    /// Directory converted files are written to.
    pub dest_dir: PathBuf,

    /// Items between engine purges.
    #[arg(
        long,
        default_value_t = DEFAULT_PURGE_FREQUENCY,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub purge_frequency: u32,

    /// Where to write the completion report.
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub export: ExportArgs,
}

impl WorkerArgs {
    pub fn settings(&self) -> WorkerSettings {
        WorkerSettings {
            source_dir: self.source_dir.clone(),
            dest_dir: self.dest_dir.clone(),
            purge_frequency: self.purge_frequency,
            report_path: self.report.clone(),
        }
    }
}

/// Output format argument.
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormatArg {
    /// Per-batch table.
    #[default]
    Table,
    /// JSON output.
    Json,
    /// Plain text output (no colors).
    Plain,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Plain => OutputFormat::Plain,
        }
    }
}
