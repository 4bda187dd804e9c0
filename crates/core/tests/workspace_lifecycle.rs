//! Workspace lifecycle integration tests.
//!
//! These tests drive the full sequence with a mock content server and a mock
//! viewer: login -> fetch -> embed -> save / add-version.

use std::sync::Arc;
use std::time::Duration;

use redline_core::{
    testing::{fixtures, MockContentServer, MockViewer, MockViewerFactory, MOCK_BASE_URL},
    viewer::EXPORT_HEADER_ITEM_ID,
    ActionOutcome, Config, ContentServerError, DocumentExtension, NodeId, OperationEvent,
    OperationStatus, PipelineError, StartupError, Trigger, Workspace,
};

/// Test helper bundling the mocks with a started workspace.
struct TestHarness {
    server: Arc<MockContentServer>,
    factory: MockViewerFactory,
    config: Config,
}

impl TestHarness {
    async fn new() -> Self {
        let server = Arc::new(MockContentServer::new());
        server.set_ticket("T1").await;
        server
            .set_content(fixtures::pdf_bytes(), Some("application/pdf"))
            .await;

        Self {
            server,
            factory: MockViewerFactory::new(),
            config: fixtures::config(MOCK_BASE_URL, 3161737),
        }
    }

    fn with_viewer(mut self, viewer: Arc<MockViewer>) -> Self {
        self.factory = MockViewerFactory::with_viewer(viewer);
        self
    }

    async fn start(&self) -> Result<Workspace, StartupError> {
        Workspace::start(&self.config, self.server.clone(), &self.factory).await
    }

    async fn started(&self) -> Workspace {
        let workspace = self.start().await.expect("workspace should start");
        assert!(workspace.wait_until_loaded(Duration::from_secs(1)).await);
        workspace
    }
}

#[tokio::test]
async fn test_end_to_end_add_version() {
    let harness = TestHarness::new().await;
    let workspace = harness.started().await;

    // The ticket from the login is used for the fetch.
    let fetches = harness.server.recorded_fetches().await;
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].node_id, NodeId(3161737));
    assert_eq!(fetches[0].ticket, "T1");

    // The viewer received the document typed as pdf.
    let viewer = harness.factory.last_viewer().await.unwrap();
    let loaded = viewer.loaded_documents().await;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].extension, DocumentExtension::Pdf);

    let tracked = workspace.add_version().await;
    let receipt = tracked.result.unwrap();
    assert_eq!(receipt.node_id, NodeId(3161737));

    let uploads = harness.server.recorded_uploads().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].ticket, "T1");
    assert_eq!(uploads[0].upload.node_id, NodeId(3161737));
    assert_eq!(uploads[0].upload.file_name, "document.pdf");

    let operation = workspace
        .tracker()
        .get(tracked.operation_id)
        .await
        .unwrap();
    assert_eq!(operation.trigger, Trigger::AddVersion);
    assert!(matches!(operation.status, OperationStatus::Succeeded { .. }));
}

#[tokio::test]
async fn test_login_rejection_stops_startup() {
    let harness = TestHarness::new().await;
    harness
        .server
        .set_auth_error(ContentServerError::Rejected {
            status: 403,
            message: "forbidden".into(),
        })
        .await;

    let err = harness.start().await.err().unwrap();

    assert!(matches!(
        err,
        StartupError::Auth(ContentServerError::Rejected { status: 403, .. })
    ));
    assert_eq!(harness.server.fetch_count().await, 0);
    assert_eq!(harness.factory.created_count().await, 0);
}

#[tokio::test]
async fn test_unauthorized_fetch_stops_startup() {
    let harness = TestHarness::new().await;
    harness
        .server
        .push_fetch_error(ContentServerError::Unauthorized)
        .await;

    let err = harness.start().await.err().unwrap();

    assert!(matches!(
        err,
        StartupError::Fetch(ContentServerError::Unauthorized)
    ));
    // 401 is not transient, so it is not retried.
    assert_eq!(harness.server.fetch_count().await, 1);
    assert_eq!(harness.factory.created_count().await, 0);
}

#[tokio::test]
async fn test_viewer_failure_stops_startup() {
    let harness = TestHarness::new().await;
    harness.factory.set_create_error(true).await;

    let err = harness.start().await.err().unwrap();
    assert!(matches!(err, StartupError::Viewer(_)));
}

#[tokio::test]
async fn test_two_rapid_saves_are_independent() {
    let harness = TestHarness::new().await;
    let workspace = harness.started().await;

    let (first, second) = tokio::join!(workspace.save_as_file(), workspace.save_as_file());
    assert_ne!(first.operation_id, second.operation_id);

    let first = first.result.unwrap();
    let second = second.result.unwrap();

    let mut expected = fixtures::pdf_bytes();
    expected.extend_from_slice(b"<xfdf/>");
    assert_eq!(first.bytes, expected);
    assert_eq!(second.bytes, expected);
    assert_eq!(first.file_name, "document.pdf");
    assert_eq!(harness.server.upload_count().await, 0);
}

#[tokio::test]
async fn test_non_pdf_document_is_docx() {
    let harness = TestHarness::new().await;
    harness.server.set_content(b"PK\x03\x04".to_vec(), None).await;
    let workspace = harness.started().await;

    assert_eq!(workspace.file_name(), "document.docx");
    let status = workspace.status().await;
    assert_eq!(status.extension, DocumentExtension::Docx);

    let file = workspace.save_as_file().await.result.unwrap();
    assert_eq!(
        file.mime_type,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
}

#[tokio::test]
async fn test_header_action_runs_save_sequence() {
    let harness = TestHarness::new().await;
    let workspace = harness.started().await;

    let tracked = workspace.run_header_action(EXPORT_HEADER_ITEM_ID).await;
    assert!(matches!(tracked.result, Ok(ActionOutcome::Saved(_))));

    let operation = workspace
        .tracker()
        .get(tracked.operation_id)
        .await
        .unwrap();
    assert_eq!(
        operation.trigger,
        Trigger::HeaderAction {
            id: EXPORT_HEADER_ITEM_ID.to_string()
        }
    );
    assert_eq!(harness.server.upload_count().await, 0);
}

#[tokio::test]
async fn test_trigger_before_document_loaded() {
    let viewer = Arc::new(MockViewer::new());
    viewer.set_emit_on_load(false).await;
    let harness = TestHarness::new().await.with_viewer(viewer);

    let workspace = harness.start().await.unwrap();
    assert!(!workspace.wait_until_loaded(Duration::from_millis(50)).await);

    let tracked = workspace.save_as_file().await;
    assert!(matches!(tracked.result, Err(PipelineError::NotLoaded)));

    let operation = workspace
        .tracker()
        .get(tracked.operation_id)
        .await
        .unwrap();
    assert!(matches!(operation.status, OperationStatus::Failed { .. }));
}

#[tokio::test]
async fn test_cancelling_an_operation() {
    let viewer = Arc::new(MockViewer::new());
    viewer.set_export_delay(Duration::from_secs(10)).await;
    let harness = TestHarness::new().await.with_viewer(viewer);
    let workspace = Arc::new(harness.started().await);

    let tracker = workspace.tracker();
    let mut events = tracker.subscribe();

    let task = tokio::spawn({
        let workspace = Arc::clone(&workspace);
        async move { workspace.add_version().await }
    });

    let id = match events.recv().await.unwrap() {
        OperationEvent::Started { operation } => operation.id,
        other => panic!("unexpected event: {:?}", other),
    };
    tracker.cancel(id).await;

    let tracked = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tracked.operation_id, id);
    assert!(matches!(tracked.result, Err(PipelineError::Cancelled)));
    assert_eq!(
        tracker.get(id).await.unwrap().status,
        OperationStatus::Cancelled
    );
    assert_eq!(workspace.status().await.operations_in_flight, 0);
    assert_eq!(harness.server.upload_count().await, 0);
}

#[tokio::test]
async fn test_trigger_timeout() {
    let viewer = Arc::new(MockViewer::new());
    viewer.set_export_delay(Duration::from_secs(5)).await;
    let mut harness = TestHarness::new().await.with_viewer(viewer);
    harness.config.pipeline.trigger_timeout_secs = 1;
    let workspace = harness.started().await;

    let tracked = workspace.save_as_file().await;
    assert!(matches!(
        tracked.result,
        Err(PipelineError::TimedOut { secs: 1 })
    ));
}

#[tokio::test]
async fn test_dropped_trigger_is_recorded_as_cancelled() {
    let viewer = Arc::new(MockViewer::new());
    viewer.set_export_delay(Duration::from_secs(2)).await;
    let harness = TestHarness::new().await.with_viewer(viewer);
    let workspace = harness.started().await;

    let tracker = workspace.tracker();
    let mut events = tracker.subscribe();

    // The caller gives up while the export is still running
    let abandoned =
        tokio::time::timeout(Duration::from_millis(100), workspace.save_as_file()).await;
    assert!(abandoned.is_err());

    let finished = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if let OperationEvent::Finished { operation } = events.recv().await.unwrap() {
                return operation;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(finished.status, OperationStatus::Cancelled);
    assert!(finished.finished_at.is_some());

    assert_eq!(workspace.status().await.operations_in_flight, 0);
    let operations = tracker.list().await;
    assert_eq!(operations.len(), 1);
    assert_eq!(operations[0].status, OperationStatus::Cancelled);
}

#[tokio::test]
async fn test_status_after_startup() {
    let harness = TestHarness::new().await;
    let workspace = harness.started().await;

    let status = workspace.status().await;
    assert_eq!(status.server_url, MOCK_BASE_URL);
    assert_eq!(status.node_id, NodeId(3161737));
    assert!(status.authenticated);
    assert!(status.document_loaded);
    assert_eq!(status.viewer, "mock");

    let ui = workspace.viewer_ui_state();
    assert_eq!(ui.disabled_elements.len(), 4);
    assert_eq!(ui.header_items[0].id, EXPORT_HEADER_ITEM_ID);
}
