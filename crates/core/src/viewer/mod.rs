//! Viewer abstraction and embedding.
//!
//! A `Viewer` is the document engine: it renders, holds the annotation model
//! and re-serializes files. This crate never looks inside; it mounts a viewer,
//! applies static chrome settings, loads the fetched document and listens for
//! lifecycle events.
//!
//! `ProcessViewer` is the shipped engine, driving an external program.

mod embedder;
mod error;
mod process;
mod traits;
mod types;

pub use embedder::{EmbedSettings, EmbeddedViewer, ViewerEmbedder, EXPORT_HEADER_ITEM_ID};
pub use error::ViewerError;
pub use process::{ProcessViewer, ProcessViewerFactory};
pub use traits::{Viewer, ViewerFactory};
pub use types::{
    AnnotationExport, HeaderAction, HeaderItem, MountPoint, UiElement, ViewerEvent, ViewerUiState,
};
