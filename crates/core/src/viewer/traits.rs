//! Trait definitions for viewer engines.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::document::DocumentHandle;

use super::error::ViewerError;
use super::types::{AnnotationExport, HeaderItem, MountPoint, UiElement, ViewerEvent, ViewerUiState};

/// A document viewer instance.
///
/// Rendering, the annotation model and file serialization are the engine's
/// business; this crate only drives it.
#[async_trait]
pub trait Viewer: Send + Sync {
    /// Returns the name of this viewer implementation.
    fn name(&self) -> &str;

    /// Load document bytes typed by the handle's extension.
    async fn load_document(&self, document: DocumentHandle) -> Result<(), ViewerError>;

    /// Hide built-in UI elements.
    async fn disable_elements(&self, elements: &[UiElement]) -> Result<(), ViewerError>;

    /// Replace the custom header items.
    async fn set_header_items(&self, items: Vec<HeaderItem>) -> Result<(), ViewerError>;

    /// Export the current annotations.
    async fn export_annotations(&self) -> Result<AnnotationExport, ViewerError>;

    /// Produce a new file body with the given annotations embedded.
    ///
    /// Every call returns a fresh buffer.
    async fn file_data(&self, annotations: &AnnotationExport) -> Result<Vec<u8>, ViewerError>;

    /// Subscribe to lifecycle events.
    fn subscribe(&self) -> broadcast::Receiver<ViewerEvent>;

    /// Current chrome configuration.
    fn ui_state(&self) -> ViewerUiState;
}

/// Constructs viewers at a mount point.
#[async_trait]
pub trait ViewerFactory: Send + Sync {
    async fn create(&self, mount: &MountPoint) -> Result<Arc<dyn Viewer>, ViewerError>;
}
