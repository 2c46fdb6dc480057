//! Completion report a worker leaves for its supervisor.
//!
//! Written as a single JSON document to the path given by `--report` when the
//! worker's input closes. A worker that dies early never writes one.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What one worker did with its batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Items read from the pipe and handed to the engine.
    pub attempted: usize,
    /// Identifiers whose conversion failed, in processing order.
    #[serde(default)]
    pub failed: Vec<String>,
    /// Reclamations performed.
    #[serde(default)]
    pub purges: usize,
    /// Worker-side processing time in milliseconds.
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl WorkerReport {
    /// Items whose conversion succeeded.
    pub fn succeeded(&self) -> usize {
        self.attempted.saturating_sub(self.failed.len())
    }

    /// Write the report, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a report. `Ok(None)` when the worker never wrote one.
    pub fn read_from(path: &Path) -> Result<Option<Self>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch-0.json");
        let report = WorkerReport {
            attempted: 5,
            failed: vec!["broken.obj".into()],
            purges: 1,
            elapsed_ms: 42,
        };
        report.write_to(&path).unwrap();
        assert_eq!(WorkerReport::read_from(&path).unwrap(), Some(report));
    }

    #[test]
    fn test_missing_report_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never-written.json");
        assert_eq!(WorkerReport::read_from(&path).unwrap(), None);
    }

    #[test]
    fn test_minimal_report_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("minimal.json");
        std::fs::write(&path, r#"{"attempted":3}"#).unwrap();
        let report = WorkerReport::read_from(&path).unwrap().unwrap();
        assert_eq!(report.attempted, 3);
        assert!(report.failed.is_empty());
        assert_eq!(report.succeeded(), 3);
    }

    #[test]
    fn test_garbage_report_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(WorkerReport::read_from(&path).is_err());
    }

    #[test]
    fn test_succeeded_counts() {
        let report = WorkerReport {
            attempted: 4,
            failed: vec!["a.obj".into(), "b.obj".into()],
            ..Default::default()
        };
        assert_eq!(report.succeeded(), 2);
    }
}
