//! Worker process launching.
//!
//! Uses `std::process::Command` (posix_spawn where available) rather than a
//! bare fork, so the engine never inherits the supervisor's threads.

use super::proc::WorkerHandle;
use crate::engine::ExportOptions;
use crate::error::{MeshBatchError, Result};
use crate::jobs::Batch;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Everything a launcher needs to start the worker for one batch.
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    pub batch: &'a Batch,
    pub source_dir: &'a Path,
    pub dest_dir: &'a Path,
    pub purge_frequency: u32,
    /// Where the worker leaves its completion report.
    pub report_path: &'a Path,
}

/// Starts one worker process per batch.
pub trait WorkerLauncher: Sync {
    fn launch(&self, request: &LaunchRequest<'_>) -> Result<WorkerHandle>;
}

/// Launches a worker by running a program with the standard worker arguments:
///
/// ```text
/// <program> <leading args> <source> <dest> --purge-frequency N --report PATH <trailing args>
/// ```
///
/// stdin is piped for the item stream; stdout and stderr are inherited so
/// progress lines and logs reach the operator, unless progress is disabled.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    leading_args: Vec<OsString>,
    trailing_args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    show_progress: bool,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            trailing_args: Vec::new(),
            envs: Vec::new(),
            show_progress: true,
        }
    }

    /// Re-run this executable in its hidden `worker` mode.
    pub fn current_exe(export: ExportOptions) -> Result<Self> {
        let exe_path = std::env::current_exe().map_err(|e| {
            MeshBatchError::Worker(format!("Failed to get current executable: {}", e))
        })?;

        let mut command = Self::new(exe_path).leading_arg("worker");
        if !export.keep_uvs {
            command = command.trailing_arg("--no-uvs");
        }
        if export.keep_normals {
            command = command.trailing_arg("--keep-normals");
        }
        if export.keep_materials {
            command = command.trailing_arg("--keep-materials");
        }
        Ok(command)
    }

    /// Argument placed before the positional directories.
    pub fn leading_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    /// Argument placed after the standard options.
    pub fn trailing_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.trailing_args.push(arg.into());
        self
    }

    /// Extra environment variable for every worker.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Discard worker progress lines instead of inheriting stdout.
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn build(&self, request: &LaunchRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg(request.source_dir)
            .arg(request.dest_dir)
            .arg("--purge-frequency")
            .arg(request.purge_frequency.to_string())
            .arg("--report")
            .arg(request.report_path)
            .args(&self.trailing_args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .env(BATCH_INDEX_ENV, request.batch.index.to_string())
            .stdin(Stdio::piped())
            .stdout(if self.show_progress {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::inherit());
        cmd
    }
}

/// Environment variable carrying the batch index into the worker (for its log lines).
pub const BATCH_INDEX_ENV: &str = "MESHBATCH_BATCH_INDEX";

impl WorkerLauncher for WorkerCommand {
    fn launch(&self, request: &LaunchRequest<'_>) -> Result<WorkerHandle> {
        let child = self
            .build(request)
            .spawn()
            .map_err(|e| MeshBatchError::SpawnFailure {
                batch: request.batch.index,
                message: format!("{}: {}", self.program.display(), e),
            })?;

        WorkerHandle::from_child(child)
    }
}
