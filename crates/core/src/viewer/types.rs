//! Types exchanged with a viewer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a viewer instance is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    dir: PathBuf,
    library_path: PathBuf,
}

impl MountPoint {
    pub fn new(dir: impl Into<PathBuf>, library_path: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            library_path: library_path.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Viewer library assets.
    pub fn library_path(&self) -> &Path {
        &self.library_path
    }
}

/// Name of a built-in viewer UI element (the viewer's `data-element` key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UiElement(pub String);

impl UiElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a header item does when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderAction {
    /// Export annotations, re-serialize and offer the file as a download.
    SaveAsFile,
    /// Export annotations, re-serialize and upload a new version.
    AddVersion,
}

/// A custom button added to the viewer header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderItem {
    pub id: String,
    pub label: String,
    pub action: HeaderAction,
}

/// Lifecycle events emitted by a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerEvent {
    DocumentLoaded,
    AnnotationsLoaded,
}

/// Serialized annotations (XFDF) exported from the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationExport(String);

impl AnnotationExport {
    pub fn new(xfdf: impl Into<String>) -> Self {
        Self(xfdf.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Chrome configuration a front end needs to render the viewer panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerUiState {
    pub disabled_elements: Vec<UiElement>,
    pub header_items: Vec<HeaderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_item_serialization() {
        let item = HeaderItem {
            id: "export-annotations".to_string(),
            label: "Export".to_string(),
            action: HeaderAction::SaveAsFile,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["action"], "save_as_file");
        assert_eq!(json["id"], "export-annotations");
    }

    #[test]
    fn test_ui_element_is_plain_string_in_json() {
        let json = serde_json::to_string(&UiElement::new("leftPanel")).unwrap();
        assert_eq!(json, "\"leftPanel\"");
    }

    #[test]
    fn test_annotation_export_emptiness() {
        assert!(AnnotationExport::new("  \n").is_empty());
        assert!(!AnnotationExport::new("<xfdf/>").is_empty());
    }
}
