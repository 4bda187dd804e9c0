//! HTTP-level tests for the content server client.
//!
//! An in-process axum server plays the content server and records what it
//! receives, so header, query and multipart layout can be asserted.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use secrecy::Secret;
use serde_json::json;

use redline_core::{
    config::{ContentServerConfig, RetryConfig},
    content_server::{ContentServer, VersionUpload, TICKET_HEADER},
    testing::{fixtures, MockViewerFactory},
    Credentials, ContentServerError, NodeId, OtcsClient, Ticket, Workspace,
};

const CGI_PATH: &str = "/otcs/cs.exe";

#[derive(Debug, Clone, Default)]
struct RecordedRequest {
    path: String,
    query_ticket: Option<String>,
    header_ticket: Option<String>,
    /// (field name, file name, content type, body)
    parts: Vec<(String, Option<String>, Option<String>, Vec<u8>)>,
}

#[derive(Clone, Default)]
struct FakeServer {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeServer {
    fn record(&self, request: RecordedRequest) {
        self.requests.lock().unwrap().push(request);
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn header_ticket(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TICKET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn auth(Form(form): Form<HashMap<String, String>>) -> Response {
    let ok = form.get("username").map(String::as_str) == Some("admin")
        && form.get("password").map(String::as_str) == Some("secret");
    if ok {
        Json(json!({ "ticket": "T1" })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "bad credentials").into_response()
    }
}

async fn content(
    State(fake): State<FakeServer>,
    Path(id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let ticket = header_ticket(&headers);
    fake.record(RecordedRequest {
        path: format!("/api/v1/nodes/{}/content", id),
        query_ticket: query.get(TICKET_HEADER).cloned(),
        header_ticket: ticket.clone(),
        ..Default::default()
    });

    if ticket.as_deref() != Some("T1") {
        return (StatusCode::UNAUTHORIZED, "invalid ticket").into_response();
    }
    match id {
        500 => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        2 => ([(header::CONTENT_TYPE, "application/octet-stream")], b"PK\x03\x04".to_vec())
            .into_response(),
        _ => (
            [(header::CONTENT_TYPE, "application/pdf")],
            fixtures::pdf_bytes(),
        )
            .into_response(),
    }
}

async fn versions(
    State(fake): State<FakeServer>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let body = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push((name, file_name, content_type, body));
    }

    fake.record(RecordedRequest {
        path: format!("/api/v2/nodes/{}/versions", id),
        header_ticket: header_ticket(&headers),
        parts,
        ..Default::default()
    });

    Json(json!({ "results": { "id": id, "version_number": 2 } })).into_response()
}

async fn spawn_fake() -> (FakeServer, String) {
    let fake = FakeServer::default();
    let api = Router::new()
        .route("/api/v1/auth", post(auth))
        .route("/api/v1/nodes/{id}/content", get(content))
        .route("/api/v2/nodes/{id}/versions", post(versions))
        .with_state(fake.clone());
    let app = Router::new().nest(CGI_PATH, api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (fake, format!("http://{}{}", addr, CGI_PATH))
}

fn client_config(url: &str) -> ContentServerConfig {
    ContentServerConfig {
        url: url.to_string(),
        username: "admin".to_string(),
        password: Secret::new("secret".to_string()),
        timeout_secs: 5,
        retry: RetryConfig::default(),
    }
}

fn credentials(password: &str) -> Credentials {
    Credentials::new("admin", Secret::new(password.to_string()))
}

#[tokio::test]
async fn test_login_returns_ticket() {
    let (_fake, url) = spawn_fake().await;
    let client = OtcsClient::new(&client_config(&url)).unwrap();

    let ticket = client.authenticate(&credentials("secret")).await.unwrap();
    assert_eq!(ticket.as_str(), "T1");

    let err = client.authenticate(&credentials("wrong")).await.unwrap_err();
    assert_eq!(err, ContentServerError::Unauthorized);
}

#[tokio::test]
async fn test_fetch_sends_ticket_in_header_and_query() {
    let (fake, url) = spawn_fake().await;
    let client = OtcsClient::new(&client_config(&url)).unwrap();

    let content = client
        .fetch_content(NodeId(3161737), &Ticket::new("T1"))
        .await
        .unwrap();
    assert_eq!(content.bytes, fixtures::pdf_bytes());
    assert_eq!(content.content_type.as_deref(), Some("application/pdf"));

    let requests = fake.requests();
    assert_eq!(requests[0].path, "/api/v1/nodes/3161737/content");
    assert_eq!(requests[0].query_ticket.as_deref(), Some("T1"));
    assert_eq!(requests[0].header_ticket.as_deref(), Some("T1"));
}

#[tokio::test]
async fn test_fetch_failures_are_distinguishable() {
    let (_fake, url) = spawn_fake().await;
    let client = OtcsClient::new(&client_config(&url)).unwrap();

    let unauthorized = client
        .fetch_content(NodeId(1), &Ticket::new("stale"))
        .await
        .unwrap_err();
    assert_eq!(unauthorized, ContentServerError::Unauthorized);

    let server_error = client
        .fetch_content(NodeId(500), &Ticket::new("T1"))
        .await
        .unwrap_err();
    assert!(matches!(
        server_error,
        ContentServerError::Rejected { status: 500, .. }
    ));
    assert!(server_error.is_transient());

    let refused = OtcsClient::new(&client_config("http://127.0.0.1:1/otcs/cs.exe"))
        .unwrap()
        .fetch_content(NodeId(1), &Ticket::new("T1"))
        .await
        .unwrap_err();
    assert!(refused.is_connection_failure());
    assert_ne!(refused, ContentServerError::Unauthorized);
}

#[tokio::test]
async fn test_add_version_posts_multipart_file() {
    let (fake, url) = spawn_fake().await;
    let client = OtcsClient::new(&client_config(&url)).unwrap();

    let response = client
        .add_version(
            VersionUpload {
                node_id: NodeId(3161737),
                file_name: "document.pdf".into(),
                mime_type: "application/pdf".into(),
                bytes: b"%PDF-annotated".to_vec(),
            },
            &Ticket::new("T1"),
        )
        .await
        .unwrap();
    assert_eq!(response["results"]["version_number"], 2);

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, "/api/v2/nodes/3161737/versions");
    assert_eq!(request.header_ticket.as_deref(), Some("T1"));
    assert_eq!(request.parts.len(), 1);

    let (name, file_name, content_type, body) = &request.parts[0];
    assert_eq!(name, "file");
    assert_eq!(file_name.as_deref(), Some("document.pdf"));
    assert_eq!(content_type.as_deref(), Some("application/pdf"));
    assert_eq!(body, b"%PDF-annotated");
}

#[tokio::test]
async fn test_workspace_round_trip_over_http() {
    let (fake, url) = spawn_fake().await;
    let config = fixtures::config(&url, 3161737);
    let client = Arc::new(OtcsClient::new(&config.content_server).unwrap());
    let factory = MockViewerFactory::new();

    let workspace = Workspace::start(&config, client, &factory).await.unwrap();
    assert!(workspace.wait_until_loaded(Duration::from_secs(1)).await);

    let receipt = workspace.add_version().await.result.unwrap();
    assert_eq!(receipt.node_id, NodeId(3161737));

    let requests = fake.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header_ticket.as_deref(), Some("T1"));
    assert_eq!(requests[1].path, "/api/v2/nodes/3161737/versions");
    assert_eq!(requests[1].header_ticket.as_deref(), Some("T1"));
    assert_eq!(requests[1].parts[0].0, "file");

    let mut expected = fixtures::pdf_bytes();
    expected.extend_from_slice(b"<xfdf/>");
    assert_eq!(requests[1].parts[0].3, expected);
}
