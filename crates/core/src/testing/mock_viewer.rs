//! Mock viewer and viewer factory for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

use crate::document::DocumentHandle;
use crate::viewer::{
    AnnotationExport, HeaderItem, MountPoint, UiElement, Viewer, ViewerError, ViewerEvent,
    ViewerFactory, ViewerUiState,
};

/// Mock implementation of the Viewer trait.
///
/// Provides controllable behavior for testing:
/// - Emit lifecycle events on load (default) or on demand
/// - Configure the exported XFDF and simulate export/serialize failures
/// - Slow down exports to exercise timeouts and cancellation
///
/// `file_data` returns the loaded document bytes followed by the XFDF, so
/// each annotation set yields a distinct body.
#[derive(Debug)]
pub struct MockViewer {
    events: broadcast::Sender<ViewerEvent>,
    emit_on_load: Arc<RwLock<bool>>,
    loaded: Arc<RwLock<Vec<DocumentHandle>>>,
    ui: Mutex<ViewerUiState>,
    annotations: Arc<RwLock<String>>,
    fail_export: Arc<RwLock<bool>>,
    fail_file_data: Arc<RwLock<bool>>,
    export_delay: Arc<RwLock<Option<Duration>>>,
    export_count: Arc<RwLock<u32>>,
    file_data_count: Arc<RwLock<u32>>,
}

impl Default for MockViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockViewer {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events,
            emit_on_load: Arc::new(RwLock::new(true)),
            loaded: Arc::new(RwLock::new(Vec::new())),
            ui: Mutex::new(ViewerUiState::default()),
            annotations: Arc::new(RwLock::new("<xfdf/>".to_string())),
            fail_export: Arc::new(RwLock::new(false)),
            fail_file_data: Arc::new(RwLock::new(false)),
            export_delay: Arc::new(RwLock::new(None)),
            export_count: Arc::new(RwLock::new(0)),
            file_data_count: Arc::new(RwLock::new(0)),
        }
    }

    /// Whether `load_document` emits `DocumentLoaded` and `AnnotationsLoaded`.
    pub async fn set_emit_on_load(&self, emit: bool) {
        *self.emit_on_load.write().await = emit;
    }

    /// Emit a lifecycle event now.
    pub fn emit(&self, event: ViewerEvent) {
        let _ = self.events.send(event);
    }

    /// XFDF returned by `export_annotations`.
    pub async fn set_annotations(&self, xfdf: &str) {
        *self.annotations.write().await = xfdf.to_string();
    }

    pub async fn set_fail_export(&self, fail: bool) {
        *self.fail_export.write().await = fail;
    }

    pub async fn set_fail_file_data(&self, fail: bool) {
        *self.fail_file_data.write().await = fail;
    }

    /// Delay every export by `delay`.
    pub async fn set_export_delay(&self, delay: Duration) {
        *self.export_delay.write().await = Some(delay);
    }

    pub async fn loaded_documents(&self) -> Vec<DocumentHandle> {
        self.loaded.read().await.clone()
    }

    pub async fn export_count(&self) -> u32 {
        *self.export_count.read().await
    }

    pub async fn file_data_count(&self) -> u32 {
        *self.file_data_count.read().await
    }

    fn failure() -> ViewerError {
        ViewerError::EngineFailed {
            code: Some(1),
            stderr: "mock failure".to_string(),
        }
    }
}

#[async_trait]
impl Viewer for MockViewer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load_document(&self, document: DocumentHandle) -> Result<(), ViewerError> {
        if document.is_empty() {
            return Err(ViewerError::EmptyDocument);
        }
        self.loaded.write().await.push(document);

        if *self.emit_on_load.read().await {
            self.emit(ViewerEvent::DocumentLoaded);
            self.emit(ViewerEvent::AnnotationsLoaded);
        }
        Ok(())
    }

    async fn disable_elements(&self, elements: &[UiElement]) -> Result<(), ViewerError> {
        let mut ui = self.ui.lock().unwrap();
        ui.disabled_elements.extend(elements.iter().cloned());
        Ok(())
    }

    async fn set_header_items(&self, items: Vec<HeaderItem>) -> Result<(), ViewerError> {
        self.ui.lock().unwrap().header_items = items;
        Ok(())
    }

    async fn export_annotations(&self) -> Result<AnnotationExport, ViewerError> {
        *self.export_count.write().await += 1;

        let delay = *self.export_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_export.read().await {
            return Err(Self::failure());
        }
        if self.loaded.read().await.is_empty() {
            return Err(ViewerError::NoDocument);
        }
        Ok(AnnotationExport::new(self.annotations.read().await.clone()))
    }

    async fn file_data(&self, annotations: &AnnotationExport) -> Result<Vec<u8>, ViewerError> {
        *self.file_data_count.write().await += 1;

        if *self.fail_file_data.read().await {
            return Err(Self::failure());
        }
        let loaded = self.loaded.read().await;
        let document = loaded.last().ok_or(ViewerError::NoDocument)?;

        let mut bytes = document.bytes.clone();
        bytes.extend_from_slice(annotations.as_str().as_bytes());
        Ok(bytes)
    }

    fn subscribe(&self) -> broadcast::Receiver<ViewerEvent> {
        self.events.subscribe()
    }

    fn ui_state(&self) -> ViewerUiState {
        self.ui.lock().unwrap().clone()
    }
}

/// Mock implementation of the ViewerFactory trait.
///
/// Creates a fresh [`MockViewer`] per call unless one was supplied with
/// [`MockViewerFactory::with_viewer`].
#[derive(Debug, Default)]
pub struct MockViewerFactory {
    viewer: Option<Arc<MockViewer>>,
    last: Arc<RwLock<Option<Arc<MockViewer>>>>,
    mounts: Arc<RwLock<Vec<MountPoint>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockViewerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always hand out `viewer`.
    pub fn with_viewer(viewer: Arc<MockViewer>) -> Self {
        Self {
            viewer: Some(viewer),
            ..Self::default()
        }
    }

    /// Make `create` fail.
    pub async fn set_create_error(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Number of `create` calls.
    pub async fn created_count(&self) -> usize {
        self.mounts.read().await.len()
    }

    /// Mount points passed to `create`.
    pub async fn recorded_mounts(&self) -> Vec<MountPoint> {
        self.mounts.read().await.clone()
    }

    /// Viewer returned by the most recent successful `create`.
    pub async fn last_viewer(&self) -> Option<Arc<MockViewer>> {
        self.last.read().await.clone()
    }
}

#[async_trait]
impl ViewerFactory for MockViewerFactory {
    async fn create(&self, mount: &MountPoint) -> Result<Arc<dyn Viewer>, ViewerError> {
        self.mounts.write().await.push(mount.clone());

        if *self.fail.read().await {
            return Err(ViewerError::EngineNotFound {
                path: PathBuf::from("mock-engine"),
            });
        }

        let viewer = match &self.viewer {
            Some(viewer) => Arc::clone(viewer),
            None => Arc::new(MockViewer::new()),
        };
        *self.last.write().await = Some(Arc::clone(&viewer));
        Ok(viewer)
    }
}
