//! Handle to a running worker process.

use super::ipc::{LineWriter, PipeFd};
use super::signals::{TerminationReason, analyze_wait_status};
use crate::error::{MeshBatchError, Result};
use crate::jobs::JobItem;
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;
use std::os::fd::OwnedFd;

/// A spawned worker: its pid and the write end of its stdin.
///
/// Owned by exactly one supervisor thread. Dropping an unreaped handle closes
/// the input and blocks until the process exits; workers are never killed.
pub struct WorkerHandle {
    pid: Pid,
    input: Option<LineWriter>,
    reaped: bool,
}

impl WorkerHandle {
    /// Take ownership of a spawned child's stdin.
    pub fn from_child(mut child: std::process::Child) -> Result<Self> {
        let pid = Pid::from_raw(child.id() as i32);
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MeshBatchError::Worker("Child stdin not captured".into()))?;

        Ok(Self {
            pid,
            input: Some(LineWriter::new(PipeFd::new(OwnedFd::from(stdin)))),
            reaped: false,
        })
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Queue one item on the worker's input.
    pub fn send(&mut self, item: &JobItem) -> Result<()> {
        let input = self
            .input
            .as_mut()
            .ok_or_else(|| MeshBatchError::Worker(format!("Input of {} already closed", self.pid)))?;
        input
            .write_line(item.id())
            .map_err(|e| MeshBatchError::Worker(format!("Failed to send '{}': {}", item, e)))
    }

    /// Flush and close the input, signalling end of batch. Idempotent.
    pub fn close_input(&mut self) -> Result<()> {
        match self.input.take() {
            Some(input) => input
                .close()
                .map_err(|e| MeshBatchError::Worker(format!("Failed to close worker input: {}", e))),
            None => Ok(()),
        }
    }

    /// Block until the worker exits. Closes the input first if still open.
    pub fn wait(&mut self) -> Result<TerminationReason> {
        // A failed close means the worker is already gone; its status says why.
        let _ = self.close_input();

        if self.reaped {
            return Err(MeshBatchError::Worker(format!(
                "Process {} already reaped",
                self.pid
            )));
        }

        let status = loop {
            match waitpid(self.pid, None) {
                Ok(WaitStatus::Stopped(..)) | Ok(WaitStatus::Continued(_)) => continue,
                Ok(status) => break status,
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    self.reaped = true;
                    return Err(MeshBatchError::Worker(format!("waitpid failed: {}", e)));
                }
            }
        };
        self.reaped = true;
        Ok(analyze_wait_status(status))
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.wait();
        }
    }
}
