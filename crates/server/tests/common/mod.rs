//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that starts a workspace against a mock
//! content server and a mock viewer, then serves the router in-process.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use redline_core::{
    testing::{MockContentServer, MockViewer, MockViewerFactory, MOCK_BASE_URL},
    Config, Workspace,
};
use redline_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use redline_core::testing::fixtures;

/// Node id every fixture edits.
pub const NODE_ID: u64 = 3161737;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_save() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.post("/api/v1/document/save").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock content server - configure tickets, content and upload failures
    pub server: Arc<MockContentServer>,
    /// Mock viewer - control load events and exports
    pub viewer: Arc<MockViewer>,
    pub workspace: Arc<Workspace>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
    /// Parsed JSON body, `Value::Null` if the body is not JSON
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Configuration for test fixture
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Whether the viewer reports the document loaded
    pub emit_loaded: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self { emit_loaded: true }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let server = Arc::new(MockContentServer::new());
        server.set_ticket("T1").await;
        server
            .set_content(fixtures::pdf_bytes(), Some("application/pdf"))
            .await;

        let viewer = Arc::new(MockViewer::new());
        viewer.set_emit_on_load(test_config.emit_loaded).await;
        viewer
            .set_annotations("<xfdf><annots><square page=\"0\"/></annots></xfdf>")
            .await;
        let factory = MockViewerFactory::with_viewer(Arc::clone(&viewer));

        let config: Config = fixtures::config(MOCK_BASE_URL, NODE_ID);
        let workspace = Arc::new(
            Workspace::start(&config, server.clone(), &factory)
                .await
                .expect("Workspace failed to start"),
        );
        if test_config.emit_loaded {
            assert!(workspace.wait_until_loaded(Duration::from_secs(1)).await);
        }

        let state = Arc::new(AppState::new(config, Arc::clone(&workspace)));
        let router = create_router(state);

        Self {
            router,
            server,
            viewer,
            workspace,
        }
    }

    /// Make a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path).await
    }

    /// Make a body-less POST request.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request(Method::POST, path).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Method::DELETE, path).await
    }

    async fn request(&self, method: Method, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        Self::parse_response(response).await
    }

    async fn parse_response(response: axum::response::Response) -> TestResponse {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
