//! Mounting a viewer and wiring it to the workspace.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::document::{DocumentExtension, DocumentHandle, LoadState};

use super::{
    HeaderAction, HeaderItem, MountPoint, UiElement, Viewer, ViewerError, ViewerEvent,
    ViewerFactory,
};

/// Id of the header button that exports and downloads the annotated file.
pub const EXPORT_HEADER_ITEM_ID: &str = "export-annotations";

/// Static chrome configuration applied to every embedded viewer.
#[derive(Debug, Clone)]
pub struct EmbedSettings {
    pub disabled_elements: Vec<UiElement>,
    pub header_items: Vec<HeaderItem>,
}

impl EmbedSettings {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            disabled_elements: config
                .disabled_elements
                .iter()
                .map(UiElement::new)
                .collect(),
            header_items: vec![export_header_item()],
        }
    }
}

impl Default for EmbedSettings {
    fn default() -> Self {
        Self {
            disabled_elements: crate::config::DEFAULT_DISABLED_ELEMENTS
                .iter()
                .map(|name| UiElement::new(*name))
                .collect(),
            header_items: vec![export_header_item()],
        }
    }
}

fn export_header_item() -> HeaderItem {
    HeaderItem {
        id: EXPORT_HEADER_ITEM_ID.to_string(),
        label: "Export annotations".to_string(),
        action: HeaderAction::SaveAsFile,
    }
}

/// Creates viewers, applies the chrome settings and loads the document.
pub struct ViewerEmbedder {
    settings: EmbedSettings,
}

impl ViewerEmbedder {
    pub fn new(settings: EmbedSettings) -> Self {
        Self { settings }
    }

    /// Construct a viewer at `mount` and load `document` into it.
    ///
    /// Events are subscribed before the document is loaded so the
    /// document-loaded notification cannot be missed.
    pub async fn embed(
        &self,
        factory: &dyn ViewerFactory,
        mount: &MountPoint,
        document: DocumentHandle,
        load_state: LoadState,
    ) -> Result<EmbeddedViewer, ViewerError> {
        let viewer = factory.create(mount).await?;
        info!(
            viewer = viewer.name(),
            mount = %mount.dir().display(),
            "Viewer created"
        );

        let extension = document.extension;
        let listener = spawn_event_listener(viewer.as_ref(), load_state);
        let embedded = EmbeddedViewer {
            viewer,
            extension,
            listener,
        };

        embedded
            .viewer
            .disable_elements(&self.settings.disabled_elements)
            .await?;
        embedded
            .viewer
            .set_header_items(self.settings.header_items.clone())
            .await?;

        let size = document.len();
        embedded.viewer.load_document(document).await?;
        info!(size, extension = %extension, "Document handed to viewer");

        Ok(embedded)
    }
}

fn spawn_event_listener(viewer: &dyn Viewer, load_state: LoadState) -> JoinHandle<()> {
    let mut events = viewer.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ViewerEvent::AnnotationsLoaded) => {
                    info!("Annotations loaded");
                }
                Ok(ViewerEvent::DocumentLoaded) => {
                    load_state.mark_loaded();
                    info!("Document loaded");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Viewer event listener lagged");
                }
                Err(RecvError::Closed) => {
                    debug!("Viewer event stream closed");
                    break;
                }
            }
        }
    })
}

/// A mounted viewer together with its event listener.
pub struct EmbeddedViewer {
    viewer: Arc<dyn Viewer>,
    extension: DocumentExtension,
    listener: JoinHandle<()>,
}

impl EmbeddedViewer {
    pub fn viewer(&self) -> Arc<dyn Viewer> {
        Arc::clone(&self.viewer)
    }

    /// Extension the document was loaded with.
    pub fn extension(&self) -> DocumentExtension {
        self.extension
    }
}

impl Drop for EmbeddedViewer {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
