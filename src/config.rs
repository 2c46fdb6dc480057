//! Run configuration.
//!
//! A [`RunConfig`] is built once from the command line and then handed to the
//! runner by value. Nothing downstream mutates it.

use crate::engine::ExportOptions;
use crate::error::{MeshBatchError, Result};
use std::path::{Path, PathBuf};

/// Lowest accepted worker count.
pub const MIN_WORKERS: usize = 1;
/// Highest accepted worker count.
pub const MAX_WORKERS: usize = 64;
/// Lowest accepted purge frequency.
pub const MIN_PURGE_FREQUENCY: u32 = 1;
/// Highest accepted purge frequency.
pub const MAX_PURGE_FREQUENCY: u32 = 1000;
/// Items attempted between reclamations when nothing else is configured.
pub const DEFAULT_PURGE_FREQUENCY: u32 = 25;
/// File extension selected when nothing else is configured.
pub const DEFAULT_EXTENSION: &str = "obj";

/// Default worker count: half the available parallelism, clamped to the accepted range.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(4)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

/// Where converted files are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFolder {
    /// One shared destination for every working directory.
    Absolute(PathBuf),
    /// A subfolder created inside each working directory.
    Subfolder(PathBuf),
}

impl OutputFolder {
    /// Classify a user-supplied output path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_absolute() {
            Self::Absolute(path)
        } else {
            Self::Subfolder(path)
        }
    }

    /// Destination root for a given working directory.
    pub fn resolve(&self, working_dir: &Path) -> PathBuf {
        match self {
            Self::Absolute(path) => path.clone(),
            Self::Subfolder(name) => working_dir.join(name),
        }
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Source roots, processed one after another.
    pub working_dirs: Vec<PathBuf>,
    /// Destination root policy.
    pub output: OutputFolder,
    /// Maximum number of concurrent worker processes.
    pub worker_count: usize,
    /// Attempted items between engine reclamations.
    pub purge_frequency: u32,
    /// Extension (without dot, case-insensitive) that marks a file as a job.
    pub extension: String,
    /// Export options forwarded to every worker.
    pub export: ExportOptions,
}

impl RunConfig {
    /// Create a configuration with default parallelism and purge frequency.
    pub fn new(working_dirs: Vec<PathBuf>, output: OutputFolder) -> Self {
        Self {
            working_dirs,
            output,
            worker_count: default_worker_count(),
            purge_frequency: DEFAULT_PURGE_FREQUENCY,
            extension: DEFAULT_EXTENSION.to_string(),
            export: ExportOptions::default(),
        }
    }

    /// Set the worker count.
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the purge frequency.
    pub fn with_purge_frequency(mut self, purge_frequency: u32) -> Self {
        self.purge_frequency = purge_frequency;
        self
    }

    /// Set the job file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Set the export options.
    pub fn with_export(mut self, export: ExportOptions) -> Self {
        self.export = export;
        self
    }

    /// Check every value that must hold before a worker is spawned.
    pub fn validate(&self) -> Result<()> {
        if self.working_dirs.is_empty() {
            return Err(MeshBatchError::InvalidConfig(
                "at least one working directory is required".into(),
            ));
        }
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.worker_count) {
            return Err(MeshBatchError::InvalidConfig(format!(
                "worker count must be between {} and {}, got {}",
                MIN_WORKERS, MAX_WORKERS, self.worker_count
            )));
        }
        if !(MIN_PURGE_FREQUENCY..=MAX_PURGE_FREQUENCY).contains(&self.purge_frequency) {
            return Err(MeshBatchError::InvalidConfig(format!(
                "purge frequency must be between {} and {}, got {}",
                MIN_PURGE_FREQUENCY, MAX_PURGE_FREQUENCY, self.purge_frequency
            )));
        }
        if self.extension.is_empty() {
            return Err(MeshBatchError::InvalidConfig(
                "file extension must not be empty".into(),
            ));
        }
        for dir in &self.working_dirs {
            if !dir.is_dir() {
                return Err(MeshBatchError::MissingSource(dir.clone()));
            }
            if same_directory(dir, &self.output.resolve(dir)) {
                return Err(MeshBatchError::InvalidConfig(format!(
                    "output folder would overwrite the sources in {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
