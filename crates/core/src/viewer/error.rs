//! Error types for the viewer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a viewer engine.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// An operation needs a document but none has been loaded.
    #[error("No document loaded in the viewer")]
    NoDocument,

    /// The document handed to the viewer has no bytes.
    #[error("Refusing to load an empty document")]
    EmptyDocument,

    /// Engine executable could not be started.
    #[error("Viewer engine not found: {path}")]
    EngineNotFound { path: PathBuf },

    /// Engine exited unsuccessfully.
    #[error("Viewer engine failed (exit code {code:?}): {stderr}")]
    EngineFailed { code: Option<i32>, stderr: String },

    /// Engine did not finish in time.
    #[error("Viewer engine timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Engine produced something unusable.
    #[error("Invalid viewer output: {0}")]
    InvalidOutput(String),

    #[error("Viewer I/O error: {0}")]
    Io(#[from] std::io::Error),
}
