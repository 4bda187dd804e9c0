//! Document download.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::content_server::{
    retry_with_backoff, ContentServer, ContentServerError, NodeId, RetryPolicy,
};
use crate::session::Session;

use super::{DocumentExtension, DocumentHandle, LoadState};

/// Downloads a node's content with the session ticket.
pub struct DocumentFetcher {
    server: Arc<dyn ContentServer>,
    session: Arc<Session>,
    load_state: LoadState,
    retry: RetryPolicy,
}

impl DocumentFetcher {
    pub fn new(
        server: Arc<dyn ContentServer>,
        session: Arc<Session>,
        load_state: LoadState,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            server,
            session,
            load_state,
            retry,
        }
    }

    /// Fetch the document, or return an empty handle without any request if a
    /// document is already loaded. The guard is the workspace-wide flag, not
    /// the node id.
    pub async fn fetch(&self, node_id: NodeId) -> Result<DocumentHandle, ContentServerError> {
        if self.load_state.is_loaded() {
            debug!(node_id = %node_id, "Document already loaded, skipping fetch");
            return Ok(DocumentHandle::empty());
        }

        let ticket = self.session.ticket().await?;

        let result = retry_with_backoff(
            &self.retry,
            "content",
            ContentServerError::is_transient,
            || self.server.fetch_content(node_id, &ticket),
        )
        .await;

        match result {
            Ok(content) => {
                let extension =
                    DocumentExtension::from_content_type(content.content_type.as_deref());
                info!(
                    node_id = %node_id,
                    size = content.bytes.len(),
                    extension = %extension,
                    "Fetched document"
                );
                Ok(DocumentHandle::new(content.bytes, extension))
            }
            Err(ContentServerError::Unauthorized) => {
                error!(
                    node_id = %node_id,
                    "401 Unauthorized - invalid authentication ticket or credentials"
                );
                Err(ContentServerError::Unauthorized)
            }
            Err(e) => {
                error!(node_id = %node_id, error = %e, "Failed to fetch document");
                Err(e)
            }
        }
    }
}
