//! Error types for meshbatch.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for meshbatch.
#[derive(Error, Debug)]
pub enum MeshBatchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Source directory not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("Failed to spawn worker for batch {batch}: {message}")]
    SpawnFailure { batch: usize, message: String },

    #[error("Failed to convert '{item}': {message}")]
    TransformFailure { item: String, message: String },

    #[error("Worker for batch {batch} terminated abnormally: {reason}")]
    WorkerCrash { batch: usize, reason: String },

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Malformed mesh at line {line}: {message}")]
    MeshParse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for meshbatch operations.
pub type Result<T> = std::result::Result<T, MeshBatchError>;
