//! Mock content server for testing.

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::content_server::{
    ContentServer, ContentServerError, FetchedContent, NodeId, VersionUpload,
};
use crate::session::{Credentials, Ticket};

/// Base URL reported by the mock.
pub const MOCK_BASE_URL: &str = "http://mock-content-server/otcs/cs.exe";

/// A recorded content fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub node_id: NodeId,
    /// Ticket the request carried.
    pub ticket: String,
}

/// A recorded version upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub upload: VersionUpload,
    /// Ticket the request carried.
    pub ticket: String,
}

/// Mock implementation of the ContentServer trait.
///
/// Provides controllable behavior for testing:
/// - Configure the issued ticket and the served document
/// - Queue failures for fetches and uploads
/// - Track logins, fetches and uploads for assertions
///
/// Counters count every attempt; the recorded lists only hold requests
/// that succeeded.
///
/// # Example
///
/// ```rust,ignore
/// let server = MockContentServer::new();
/// server.set_ticket("T1").await;
/// server.set_content(pdf_bytes, Some("application/pdf")).await;
///
/// // ... run the workspace ...
///
/// let uploads = server.recorded_uploads().await;
/// assert_eq!(uploads[0].ticket, "T1");
/// ```
#[derive(Debug)]
pub struct MockContentServer {
    ticket: Arc<RwLock<String>>,
    auth_error: Arc<RwLock<Option<ContentServerError>>>,
    logins: Arc<RwLock<Vec<String>>>,
    content: Arc<RwLock<FetchedContent>>,
    fetch_errors: Arc<RwLock<VecDeque<ContentServerError>>>,
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    fetch_attempts: Arc<RwLock<u32>>,
    upload_errors: Arc<RwLock<VecDeque<ContentServerError>>>,
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    upload_attempts: Arc<RwLock<u32>>,
    version_response: Arc<RwLock<Option<serde_json::Value>>>,
}

impl Default for MockContentServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContentServer {
    /// Create a mock that issues `mock-ticket` and serves a small PDF.
    pub fn new() -> Self {
        Self {
            ticket: Arc::new(RwLock::new("mock-ticket".to_string())),
            auth_error: Arc::new(RwLock::new(None)),
            logins: Arc::new(RwLock::new(Vec::new())),
            content: Arc::new(RwLock::new(FetchedContent {
                bytes: b"%PDF-1.7 mock".to_vec(),
                content_type: Some("application/pdf".to_string()),
            })),
            fetch_errors: Arc::new(RwLock::new(VecDeque::new())),
            fetches: Arc::new(RwLock::new(Vec::new())),
            fetch_attempts: Arc::new(RwLock::new(0)),
            upload_errors: Arc::new(RwLock::new(VecDeque::new())),
            uploads: Arc::new(RwLock::new(Vec::new())),
            upload_attempts: Arc::new(RwLock::new(0)),
            version_response: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        MOCK_BASE_URL
    }

    /// Ticket issued by successful logins.
    pub async fn set_ticket(&self, ticket: &str) {
        *self.ticket.write().await = ticket.to_string();
    }

    /// Make every login fail with this error.
    pub async fn set_auth_error(&self, error: ContentServerError) {
        *self.auth_error.write().await = Some(error);
    }

    /// Number of login attempts.
    pub async fn auth_count(&self) -> usize {
        self.logins.read().await.len()
    }

    /// Usernames of every login attempt.
    pub async fn recorded_logins(&self) -> Vec<String> {
        self.logins.read().await.clone()
    }

    /// Document served by content fetches.
    pub async fn set_content(&self, bytes: Vec<u8>, content_type: Option<&str>) {
        *self.content.write().await = FetchedContent {
            bytes,
            content_type: content_type.map(str::to_string),
        };
    }

    /// Queue an error for the next fetch. Queued errors are consumed first.
    pub async fn push_fetch_error(&self, error: ContentServerError) {
        self.fetch_errors.write().await.push_back(error);
    }

    pub async fn fetch_count(&self) -> u32 {
        *self.fetch_attempts.read().await
    }

    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Queue an error for the next upload. Queued errors are consumed first.
    pub async fn push_upload_error(&self, error: ContentServerError) {
        self.upload_errors.write().await.push_back(error);
    }

    pub async fn upload_count(&self) -> u32 {
        *self.upload_attempts.read().await
    }

    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Acknowledgment returned by uploads instead of the generated one.
    pub async fn set_version_response(&self, response: serde_json::Value) {
        *self.version_response.write().await = Some(response);
    }
}

#[async_trait]
impl ContentServer for MockContentServer {
    fn name(&self) -> &str {
        "mock"
    }

    fn base_url(&self) -> &str {
        MOCK_BASE_URL
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Ticket, ContentServerError> {
        self.logins.write().await.push(credentials.username.clone());

        if let Some(error) = self.auth_error.read().await.clone() {
            return Err(error);
        }
        Ok(Ticket::new(self.ticket.read().await.clone()))
    }

    async fn fetch_content(
        &self,
        node_id: NodeId,
        ticket: &Ticket,
    ) -> Result<FetchedContent, ContentServerError> {
        *self.fetch_attempts.write().await += 1;

        if let Some(error) = self.fetch_errors.write().await.pop_front() {
            return Err(error);
        }

        self.fetches.write().await.push(RecordedFetch {
            node_id,
            ticket: ticket.as_str().to_string(),
        });
        Ok(self.content.read().await.clone())
    }

    async fn add_version(
        &self,
        upload: VersionUpload,
        ticket: &Ticket,
    ) -> Result<serde_json::Value, ContentServerError> {
        let attempt = {
            let mut attempts = self.upload_attempts.write().await;
            *attempts += 1;
            *attempts
        };

        if let Some(error) = self.upload_errors.write().await.pop_front() {
            return Err(error);
        }

        let node_id = upload.node_id;
        self.uploads.write().await.push(RecordedUpload {
            upload,
            ticket: ticket.as_str().to_string(),
        });

        let response = match self.version_response.read().await.clone() {
            Some(response) => response,
            None => json!({ "results": { "id": node_id.0, "version_number": attempt } }),
        };
        Ok(response)
    }
}
