//! Error types for the export/upload pipeline.

use thiserror::Error;

use crate::content_server::ContentServerError;
use crate::viewer::ViewerError;

/// Errors that end a save or add-version trigger.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The viewer has not reported the document as loaded yet.
    #[error("No document is loaded yet")]
    NotLoaded,

    #[error("Annotation export failed: {0}")]
    Export(#[source] ViewerError),

    #[error("Document serialization failed: {0}")]
    Serialize(#[source] ViewerError),

    #[error("Version upload failed: {0}")]
    Upload(#[source] ContentServerError),

    /// No header item is registered under this id.
    #[error("Unknown header action: {0}")]
    UnknownAction(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {secs}s")]
    TimedOut { secs: u64 },
}

impl PipelineError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotLoaded => "not_loaded",
            Self::Export(_) => "export",
            Self::Serialize(_) => "serialize",
            Self::Upload(_) => "upload",
            Self::UnknownAction(_) => "unknown_action",
            Self::Cancelled => "cancelled",
            Self::TimedOut { .. } => "timed_out",
        }
    }
}
