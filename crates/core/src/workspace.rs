//! Startup sequence and trigger entry points.
//!
//! A [`Workspace`] owns the session, the loaded flag, the embedded viewer and
//! the pipeline for one document. Startup is linear: log in, fetch the
//! document, embed the viewer. Afterwards every trigger runs as a tracked
//! operation with its own timeout and cancellation token.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::content_server::{ContentServer, ContentServerError, NodeId, RetryPolicy};
use crate::document::{DocumentExtension, DocumentFetcher, LoadState};
use crate::metrics::{TRIGGERS_TOTAL, TRIGGER_DURATION};
use crate::operations::{OperationId, OperationStatus, OperationTracker, Trigger};
use crate::pipeline::{
    ActionOutcome, DownloadableFile, ExportPipeline, PipelineError, PipelineSettings,
    VersionReceipt,
};
use crate::session::{Authenticator, Credentials, Session};
use crate::viewer::{
    EmbedSettings, EmbeddedViewer, HeaderItem, MountPoint, ViewerEmbedder, ViewerError,
    ViewerFactory, ViewerUiState,
};

/// Failures that abort startup. Nothing after the failing step runs.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Authentication failed: {0}")]
    Auth(#[source] ContentServerError),

    #[error("Document fetch failed: {0}")]
    Fetch(#[source] ContentServerError),

    #[error("Viewer setup failed: {0}")]
    Viewer(#[source] ViewerError),
}

/// Result of a trigger together with its correlation id.
#[derive(Debug)]
pub struct Tracked<T> {
    pub operation_id: OperationId,
    pub result: Result<T, PipelineError>,
}

/// Snapshot for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceStatus {
    pub server_url: String,
    pub node_id: NodeId,
    pub authenticated: bool,
    pub document_loaded: bool,
    pub extension: DocumentExtension,
    pub viewer: String,
    pub operations_in_flight: usize,
}

/// One authenticated session editing one document.
pub struct Workspace {
    session: Arc<Session>,
    load_state: LoadState,
    node_id: NodeId,
    embedded: EmbeddedViewer,
    pipeline: ExportPipeline,
    tracker: Arc<OperationTracker>,
    trigger_timeout: Duration,
}

impl Workspace {
    /// Log in, fetch the configured document and hand it to a new viewer.
    pub async fn start(
        config: &Config,
        server: Arc<dyn ContentServer>,
        viewer_factory: &dyn ViewerFactory,
    ) -> Result<Self, StartupError> {
        let node_id = NodeId(config.document.node_id);
        let retry = RetryPolicy::from(&config.content_server.retry);
        let session = Arc::new(Session::new(server.base_url()));
        let load_state = LoadState::new();

        info!(
            backend = server.name(),
            url = %session.server_url(),
            node_id = %node_id,
            "Starting workspace"
        );

        let credentials = Credentials::new(
            config.content_server.username.clone(),
            config.content_server.password.clone(),
        );
        Authenticator::new(Arc::clone(&server), credentials)
            .login(&session)
            .await
            .map_err(StartupError::Auth)?;

        let document = DocumentFetcher::new(
            Arc::clone(&server),
            Arc::clone(&session),
            load_state.clone(),
            retry.clone(),
        )
        .fetch(node_id)
        .await
        .map_err(StartupError::Fetch)?;

        let settings = EmbedSettings::from_config(&config.viewer);
        let header_items = settings.header_items.clone();
        let mount = MountPoint::new(
            config.viewer.mount_dir.clone(),
            config.viewer.library_path.clone(),
        );
        let embedded = ViewerEmbedder::new(settings)
            .embed(viewer_factory, &mount, document, load_state.clone())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to embed viewer");
                StartupError::Viewer(e)
            })?;

        let pipeline = ExportPipeline::new(
            embedded.viewer(),
            server,
            Arc::clone(&session),
            load_state.clone(),
            PipelineSettings {
                node_id,
                download_name: config.document.download_name.clone(),
                extension: embedded.extension(),
                header_items,
                upload_retry: retry,
            },
        );

        info!(node_id = %node_id, file_name = %pipeline.file_name(), "Workspace ready");

        Ok(Self {
            session,
            load_state,
            node_id,
            embedded,
            pipeline,
            tracker: Arc::new(OperationTracker::new()),
            trigger_timeout: Duration::from_secs(config.pipeline.trigger_timeout_secs),
        })
    }

    /// Wait for the viewer's document-loaded event. Returns `false` on timeout.
    pub async fn wait_until_loaded(&self, timeout: Duration) -> bool {
        self.load_state.wait_timeout(timeout).await
    }

    pub fn is_loaded(&self) -> bool {
        self.load_state.is_loaded()
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Name used for downloads and uploads.
    pub fn file_name(&self) -> String {
        self.pipeline.file_name()
    }

    pub fn header_items(&self) -> &[HeaderItem] {
        self.pipeline.header_items()
    }

    pub fn viewer_ui_state(&self) -> ViewerUiState {
        self.embedded.viewer().ui_state()
    }

    pub fn tracker(&self) -> Arc<OperationTracker> {
        Arc::clone(&self.tracker)
    }

    pub async fn status(&self) -> WorkspaceStatus {
        WorkspaceStatus {
            server_url: self.session.server_url().to_string(),
            node_id: self.node_id,
            authenticated: self.session.is_authenticated().await,
            document_loaded: self.load_state.is_loaded(),
            extension: self.embedded.extension(),
            viewer: self.embedded.viewer().name().to_string(),
            operations_in_flight: self.tracker.in_flight().await,
        }
    }

    /// Export the annotations and return the annotated file.
    pub async fn save_as_file(&self) -> Tracked<DownloadableFile> {
        self.run(Trigger::SaveAsFile, self.pipeline.save_as_file())
            .await
    }

    /// Export the annotations and upload the annotated file as a new version.
    pub async fn add_version(&self) -> Tracked<VersionReceipt> {
        self.run(Trigger::AddVersion, self.pipeline.add_version())
            .await
    }

    /// Run the action bound to a viewer header item.
    pub async fn run_header_action(&self, id: &str) -> Tracked<ActionOutcome> {
        self.run(
            Trigger::HeaderAction { id: id.to_string() },
            self.pipeline.run_header_action(id),
        )
        .await
    }

    /// Cancel every in-flight operation.
    pub async fn shutdown(&self) -> usize {
        self.tracker.cancel_all().await
    }

    async fn run<T, Fut>(&self, trigger: Trigger, work: Fut) -> Tracked<T>
    where
        T: OperationDetail,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let label = trigger.label();
        let (operation_id, cancel) = self.tracker.begin(trigger).await;
        let pending = PendingOperation {
            tracker: Arc::clone(&self.tracker),
            operation_id,
            label,
            finished: false,
        };
        let span = info_span!("trigger", operation_id = %operation_id, trigger = label);
        let secs = self.trigger_timeout.as_secs();
        let started = Instant::now();

        let result = async {
            info!("Trigger started");
            tokio::select! {
                _ = cancel.cancelled() => Err(PipelineError::Cancelled),
                outcome = tokio::time::timeout(self.trigger_timeout, work) => {
                    outcome.unwrap_or_else(|_| Err(PipelineError::TimedOut { secs }))
                }
            }
        }
        .instrument(span.clone())
        .await;

        let elapsed = started.elapsed();
        let status = match &result {
            Ok(value) => OperationStatus::Succeeded {
                detail: value.detail(),
            },
            Err(PipelineError::Cancelled) => OperationStatus::Cancelled,
            Err(e) => OperationStatus::Failed {
                error: e.to_string(),
            },
        };

        span.in_scope(|| match &result {
            Ok(_) => info!(elapsed_ms = elapsed.as_millis() as u64, "Trigger succeeded"),
            Err(e) => warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                kind = e.kind(),
                error = %e,
                "Trigger failed"
            ),
        });

        TRIGGERS_TOTAL
            .with_label_values(&[label, status.label()])
            .inc();
        TRIGGER_DURATION
            .with_label_values(&[label])
            .observe(elapsed.as_secs_f64());

        pending.finish(status).await;
        Tracked {
            operation_id,
            result,
        }
    }
}

/// A running operation that records `Cancelled` if its trigger is dropped
/// before reporting a result, e.g. when the HTTP client disconnects.
struct PendingOperation {
    tracker: Arc<OperationTracker>,
    operation_id: OperationId,
    label: &'static str,
    finished: bool,
}

impl PendingOperation {
    async fn finish(mut self, status: OperationStatus) {
        self.tracker.finish(self.operation_id, status).await;
        self.finished = true;
    }
}

impl Drop for PendingOperation {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        warn!(
            operation_id = %self.operation_id,
            trigger = self.label,
            "Trigger dropped before completion"
        );
        let status = OperationStatus::Cancelled;
        TRIGGERS_TOTAL
            .with_label_values(&[self.label, status.label()])
            .inc();

        let tracker = Arc::clone(&self.tracker);
        let operation_id = self.operation_id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tracker.finish(operation_id, status).await;
                });
            }
            Err(_) => warn!(
                operation_id = %operation_id,
                "No runtime to record the dropped operation"
            ),
        }
    }
}

/// One-line description recorded for a successful operation.
trait OperationDetail {
    fn detail(&self) -> String;
}

impl OperationDetail for DownloadableFile {
    fn detail(&self) -> String {
        format!("{} ({} bytes)", self.file_name, self.bytes.len())
    }
}

impl OperationDetail for VersionReceipt {
    fn detail(&self) -> String {
        format!(
            "new version of node {} ({} bytes)",
            self.node_id, self.bytes
        )
    }
}

impl OperationDetail for ActionOutcome {
    fn detail(&self) -> String {
        match self {
            ActionOutcome::Saved(file) => file.detail(),
            ActionOutcome::Uploaded(receipt) => receipt.detail(),
        }
    }
}
