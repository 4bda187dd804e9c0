//! Trait definitions for content server backends.

use async_trait::async_trait;

use crate::session::{Credentials, Ticket};

use super::error::ContentServerError;
use super::types::{FetchedContent, NodeId, VersionUpload};

/// The three content server operations this crate relies on.
///
/// Implementations do not retry; callers apply the retry policy.
#[async_trait]
pub trait ContentServer: Send + Sync {
    /// Returns the name of this backend.
    fn name(&self) -> &str;

    /// Base URL requests are issued against.
    fn base_url(&self) -> &str;

    /// `POST /api/v1/auth`, returns the issued ticket.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Ticket, ContentServerError>;

    /// `GET /api/v1/nodes/{id}/content`.
    async fn fetch_content(
        &self,
        node_id: NodeId,
        ticket: &Ticket,
    ) -> Result<FetchedContent, ContentServerError>;

    /// `POST /api/v2/nodes/{id}/versions`, returns the server's acknowledgment.
    async fn add_version(
        &self,
        upload: VersionUpload,
        ticket: &Ticket,
    ) -> Result<serde_json::Value, ContentServerError>;
}
