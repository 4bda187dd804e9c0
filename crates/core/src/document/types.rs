//! Document types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// File type hint handed to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentExtension {
    Pdf,
    Docx,
}

impl DocumentExtension {
    /// `application/pdf` (with or without parameters) is a PDF; anything else,
    /// including a missing content type, is treated as DOCX.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.trim_start().starts_with("application/pdf") => Self::Pdf,
            _ => Self::Docx,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for DocumentExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downloaded document bytes plus their type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub bytes: Vec<u8>,
    pub extension: DocumentExtension,
}

impl DocumentHandle {
    pub fn new(bytes: Vec<u8>, extension: DocumentExtension) -> Self {
        Self { bytes, extension }
    }

    /// Placeholder returned when a document is already loaded.
    pub fn empty() -> Self {
        Self {
            bytes: Vec::new(),
            extension: DocumentExtension::Docx,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}
