//! OpenText Content Server REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::ContentServerConfig;
use crate::metrics::CONTENT_SERVER_REQUESTS;
use crate::session::{Credentials, Ticket};

use super::types::AuthResponse;
use super::{ContentServer, ContentServerError, FetchedContent, NodeId, VersionUpload};

/// Header (and query parameter) carrying the session ticket.
pub const TICKET_HEADER: &str = "Otcsticket";

/// Content server client over its REST API.
pub struct OtcsClient {
    client: Client,
    base_url: String,
}

impl OtcsClient {
    /// Create a new client.
    pub fn new(config: &ContentServerConfig) -> Result<Self, ContentServerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ContentServerError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response to an error, consuming the body for context.
    async fn reject(response: Response) -> ContentServerError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return ContentServerError::Unauthorized;
        }
        let body = response.text().await.unwrap_or_default();
        ContentServerError::Rejected {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        }
    }

    fn record(endpoint: &str, result: &Result<impl Sized, ContentServerError>) {
        let label = match result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        CONTENT_SERVER_REQUESTS
            .with_label_values(&[endpoint, label])
            .inc();
    }

    async fn do_authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Ticket, ContentServerError> {
        let url = self.url("/api/v1/auth");
        let params = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose_secret().as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(ContentServerError::from_transport)?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let body: AuthResponse = response.json().await.map_err(|e| {
            ContentServerError::InvalidResponse(format!("Failed to parse auth response: {}", e))
        })?;

        match body.ticket {
            Some(ticket) if !ticket.is_empty() => {
                debug!("Content server login successful");
                Ok(Ticket::new(ticket))
            }
            _ => Err(ContentServerError::InvalidResponse(
                "auth response carries no ticket".to_string(),
            )),
        }
    }

    async fn do_fetch_content(
        &self,
        node_id: NodeId,
        ticket: &Ticket,
    ) -> Result<FetchedContent, ContentServerError> {
        let url = self.url(&format!("/api/v1/nodes/{}/content", node_id));

        let response = self
            .client
            .get(&url)
            .query(&[(TICKET_HEADER, ticket.as_str())])
            .header(TICKET_HEADER, ticket.as_str())
            .send()
            .await
            .map_err(ContentServerError::from_transport)?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(ContentServerError::from_transport)?;

        debug!(
            node_id = %node_id,
            size = bytes.len(),
            content_type = ?content_type,
            "Fetched node content"
        );

        Ok(FetchedContent {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    async fn do_add_version(
        &self,
        upload: VersionUpload,
        ticket: &Ticket,
    ) -> Result<serde_json::Value, ContentServerError> {
        let url = self.url(&format!("/api/v2/nodes/{}/versions", upload.node_id));

        let file_part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.mime_type)
            .map_err(|e| ContentServerError::Client(e.to_string()))?;
        let form = multipart::Form::new().part("file", file_part);

        let response = self
            .client
            .post(&url)
            .header(TICKET_HEADER, ticket.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(ContentServerError::from_transport)?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(ContentServerError::from_transport)?;

        Ok(parse_acknowledgment(&body))
    }
}

/// Version creation usually answers with JSON; keep anything else verbatim.
fn parse_acknowledgment(body: &str) -> serde_json::Value {
    if body.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}

#[async_trait]
impl ContentServer for OtcsClient {
    fn name(&self) -> &str {
        "otcs"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Ticket, ContentServerError> {
        let result = self.do_authenticate(credentials).await;
        Self::record("auth", &result);
        result
    }

    async fn fetch_content(
        &self,
        node_id: NodeId,
        ticket: &Ticket,
    ) -> Result<FetchedContent, ContentServerError> {
        let result = self.do_fetch_content(node_id, ticket).await;
        Self::record("content", &result);
        result
    }

    async fn add_version(
        &self,
        upload: VersionUpload,
        ticket: &Ticket,
    ) -> Result<serde_json::Value, ContentServerError> {
        let result = self.do_add_version(upload, ticket).await;
        Self::record("versions", &result);
        result
    }
}
