//! Termination analysis for worker processes.

use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;

/// Why a worker process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Normal exit with status code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(Signal),
    /// Status could not be collected.
    Unknown,
}

impl TerminationReason {
    /// Only a zero exit code counts as a completed batch.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// Human-readable description, with a hint for the signals a converter
    /// typically dies from.
    pub fn description(&self) -> String {
        match self {
            Self::Exited(code) => format!("exited with code {}", code),
            Self::Signaled(Signal::SIGKILL) => {
                "killed by SIGKILL (possibly the OOM killer)".to_string()
            }
            Self::Signaled(Signal::SIGSEGV) => "crashed with SIGSEGV".to_string(),
            Self::Signaled(Signal::SIGBUS) => "crashed with SIGBUS".to_string(),
            Self::Signaled(sig) => format!("killed by signal {}", sig.as_str()),
            Self::Unknown => "unknown reason".to_string(),
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Map a final `WaitStatus` to a termination reason.
pub fn analyze_wait_status(status: WaitStatus) -> TerminationReason {
    match status {
        WaitStatus::Exited(_, code) => TerminationReason::Exited(code),
        WaitStatus::Signaled(_, signal, _) => TerminationReason::Signaled(signal),
        _ => TerminationReason::Unknown,
    }
}
