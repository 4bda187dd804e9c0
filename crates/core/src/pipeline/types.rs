//! Outputs of the export/upload pipeline.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::content_server::NodeId;

/// Annotated document offered to the user as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadableFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of `bytes`.
    pub sha256: String,
}

impl DownloadableFile {
    pub fn new(file_name: String, mime_type: &str, bytes: Vec<u8>) -> Self {
        let sha256 = digest_hex(&bytes);
        Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
            sha256,
        }
    }
}

/// Confirmation of an uploaded version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionReceipt {
    pub node_id: NodeId,
    pub file_name: String,
    /// Size of the uploaded body.
    pub bytes: usize,
    pub sha256: String,
    /// Acknowledgment returned by the content server.
    pub response: serde_json::Value,
}

/// Result of a header action.
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    Saved(DownloadableFile),
    Uploaded(VersionReceipt),
}

pub(crate) fn digest_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
