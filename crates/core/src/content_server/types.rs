//! Request and response types for the content server API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content server node (document) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Raw body of a node's content as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub bytes: Vec<u8>,
    /// Declared `Content-Type`, if any.
    pub content_type: Option<String>,
}

/// A new version to be attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionUpload {
    pub node_id: NodeId,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Body of a successful login.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub ticket: Option<String>,
}
