//! Worker processes and their supervisor.
//!
//! Each non-empty batch runs in its own process so engine state can never
//! leak between batches, and so one crashing conversion takes down only
//! its own batch.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────┐
//!                     │   Supervisor    │
//!                     │  (meshbatch run)│
//!                     └────────┬────────┘
//!                  stdin pipe, one item per line
//!               ┌──────────────┼──────────────┐
//!               │              │              │
//!         ┌─────▼─────┐  ┌─────▼─────┐  ┌─────▼─────┐
//!         │ Worker 0  │  │ Worker 1  │  │ Worker N  │
//!         │ batch 0   │  │ batch 1   │  │ batch N   │
//!         │ purge / f │  │ purge / f │  │ purge / f │
//!         └─────┬─────┘  └─────┬─────┘  └─────┬─────┘
//!               └──── exit status + report ───┘
//! ```
//!
//! Closing a worker's stdin ends its batch. The exit status says whether the
//! batch completed; the JSON report lists per-item failures.

mod ipc;
mod proc;
mod purge;
mod report;
mod signals;
mod spawn;
mod supervisor;
pub mod worker_main;

#[cfg(test)]
pub use report::WorkerReport;
pub use spawn::{WorkerCommand, WorkerLauncher};
pub use supervisor::{BatchStatus, WorkerOutcome, WorkerSupervisor};
pub use worker_main::{WorkerSettings, run_worker_main};
