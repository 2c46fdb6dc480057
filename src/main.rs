//! meshbatch - batch mesh triangulation on recycled worker processes

mod cli;
mod config;
mod engine;
mod error;
mod jobs;
mod logging;
mod output;
mod paths;
mod runner;
mod summary;
mod worker;

use anyhow::Result;
use clap::Parser;
use owo_colors::{OwoColorize, Stream::Stderr};

use cli::{Cli, Commands, RunArgs, WorkerArgs};
use logging::{LOG_FILTER_ENV, LogConfig};
use output::OutputFormat;
use worker::WorkerCommand;

/// Exit status of a run that finished but had failed batches or items.
const EXIT_PARTIAL_FAILURE: i32 = 2;

fn main() {
    let cli = Cli::parse();

    // Affects owo_colors; comfy_table is told through TableOptions
    if cli.no_color {
        owo_colors::set_override(false);
    }

    let result = match &cli.command {
        Commands::Run(args) => cmd_run(&cli, args),
        Commands::Completions(args) => {
            args.generate();
            Ok(())
        }
        Commands::Worker(args) => cmd_worker(&cli, args),
    };

    if let Err(e) = result {
        eprintln!(
            "{}: {}",
            "error"
                .if_supports_color(Stderr, |text| text.red())
                .if_supports_color(Stderr, |text| text.bold()),
            e
        );
        // Print the error chain if there are causes
        for cause in e.chain().skip(1) {
            eprintln!(
                "  {}: {}",
                "caused by".if_supports_color(Stderr, |text| text.yellow()),
                cause
            );
        }
        std::process::exit(1);
    }
}

/// Logging for this process. Command-line flags win over environment variables.
fn log_config(cli: &Cli, base: LogConfig) -> LogConfig {
    let mut config = if cli.quiet {
        base.with_level(tracing::Level::ERROR)
    } else {
        base.with_verbosity(cli.verbose)
    };
    if cli.quiet || cli.verbose > 0 {
        let filter = config.effective_filter();
        config = config.with_filter(filter);
    }

    let mut config = config.with_env_overrides();
    if let Some(format) = cli.log_format {
        config = config.with_format(format);
    }
    if let Some(path) = &cli.log_file {
        config = config.with_file(paths::expand_tilde(path));
    }
    if cli.no_color {
        config = config.with_ansi(false);
    }
    config
}

fn cmd_run(cli: &Cli, args: &RunArgs) -> Result<()> {
    let log = log_config(cli, LogConfig::for_supervisor());
    logging::init(log.clone());

    let format = OutputFormat::from(args.format);
    let config = args.to_config();

    let mut launcher = WorkerCommand::current_exe(config.export)?
        .env(LOG_FILTER_ENV, log.effective_filter())
        .env("MESHBATCH_LOG_FORMAT", log.format.to_string());
    // Keep stdout clean for machine-readable or suppressed output
    if cli.quiet || format == OutputFormat::Json {
        launcher = launcher.without_progress();
    }

    let summary = runner::run(config, &launcher)?;

    if !cli.quiet {
        output::print_summary(&summary, format, args.table_options(!cli.no_color));
    }

    if summary.has_failures() {
        tracing::warn!(
            failed_batches = summary.totals.failed_batches,
            failed_items = summary.totals.failed_items,
            "Run finished with failures"
        );
        std::process::exit(EXIT_PARTIAL_FAILURE);
    }
    Ok(())
}

fn cmd_worker(cli: &Cli, args: &WorkerArgs) -> Result<()> {
    logging::init(log_config(cli, LogConfig::for_worker()));

    // Never returns
    worker::run_worker_main(args.settings(), args.export.into())
}
