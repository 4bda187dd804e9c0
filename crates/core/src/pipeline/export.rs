//! Export → serialize → download or upload.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::content_server::{
    retry_with_backoff, ContentServer, ContentServerError, NodeId, RetryPolicy, VersionUpload,
};
use crate::document::{DocumentExtension, LoadState};
use crate::session::Session;
use crate::viewer::{HeaderAction, HeaderItem, Viewer};

use super::types::digest_hex;
use super::{ActionOutcome, DownloadableFile, PipelineError, VersionReceipt};

/// Per-document settings for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub node_id: NodeId,
    /// File stem; the extension follows the loaded document.
    pub download_name: String,
    pub extension: DocumentExtension,
    /// Header items registered with the viewer.
    pub header_items: Vec<HeaderItem>,
    /// Applied to connection failures only.
    pub upload_retry: RetryPolicy,
}

/// Runs the save and add-version sequences against a loaded viewer.
///
/// Every call works on its own buffers, so concurrent triggers are
/// independent of each other.
pub struct ExportPipeline {
    viewer: Arc<dyn Viewer>,
    server: Arc<dyn ContentServer>,
    session: Arc<Session>,
    load_state: LoadState,
    settings: PipelineSettings,
}

impl ExportPipeline {
    pub fn new(
        viewer: Arc<dyn Viewer>,
        server: Arc<dyn ContentServer>,
        session: Arc<Session>,
        load_state: LoadState,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            viewer,
            server,
            session,
            load_state,
            settings,
        }
    }

    /// Name offered for downloads and uploads, e.g. `document.pdf`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.settings.download_name, self.settings.extension)
    }

    pub fn header_items(&self) -> &[HeaderItem] {
        &self.settings.header_items
    }

    /// Export the annotations and return the annotated file for download.
    pub async fn save_as_file(&self) -> Result<DownloadableFile, PipelineError> {
        let bytes = self.render().await?;
        let file = DownloadableFile::new(
            self.file_name(),
            self.settings.extension.mime_type(),
            bytes,
        );
        info!(
            file_name = %file.file_name,
            size = file.bytes.len(),
            sha256 = %file.sha256,
            "Annotated file ready for download"
        );
        Ok(file)
    }

    /// Export the annotations and post the annotated file as a new version.
    pub async fn add_version(&self) -> Result<VersionReceipt, PipelineError> {
        let bytes = self.render().await?;
        let ticket = self.session.ticket().await.map_err(PipelineError::Upload)?;

        let node_id = self.settings.node_id;
        let upload = VersionUpload {
            node_id,
            file_name: self.file_name(),
            mime_type: self.settings.extension.mime_type().to_string(),
            bytes,
        };
        let size = upload.bytes.len();
        let sha256 = digest_hex(&upload.bytes);
        let file_name = upload.file_name.clone();

        // A response means the server may have created the version already.
        let result = retry_with_backoff(
            &self.settings.upload_retry,
            "versions",
            ContentServerError::is_connection_failure,
            || self.server.add_version(upload.clone(), &ticket),
        )
        .await;

        match result {
            Ok(response) => {
                info!(node_id = %node_id, size, sha256 = %sha256, "Version uploaded");
                Ok(VersionReceipt {
                    node_id,
                    file_name,
                    bytes: size,
                    sha256,
                    response,
                })
            }
            Err(e) => {
                error!(node_id = %node_id, error = %e, "Failed to upload version");
                Err(PipelineError::Upload(e))
            }
        }
    }

    /// Run the action bound to a registered header item.
    pub async fn run_header_action(&self, id: &str) -> Result<ActionOutcome, PipelineError> {
        let action = self
            .settings
            .header_items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.action)
            .ok_or_else(|| PipelineError::UnknownAction(id.to_string()))?;

        debug!(id, ?action, "Running header action");
        match action {
            HeaderAction::SaveAsFile => self.save_as_file().await.map(ActionOutcome::Saved),
            HeaderAction::AddVersion => self.add_version().await.map(ActionOutcome::Uploaded),
        }
    }

    /// Shared first half of both triggers: export then re-serialize.
    async fn render(&self) -> Result<Vec<u8>, PipelineError> {
        if !self.load_state.is_loaded() {
            return Err(PipelineError::NotLoaded);
        }

        let annotations = self.viewer.export_annotations().await.map_err(|e| {
            error!(error = %e, "Failed to export annotations");
            PipelineError::Export(e)
        })?;
        debug!(xfdf_len = annotations.as_str().len(), "Exported annotations");

        let bytes = self.viewer.file_data(&annotations).await.map_err(|e| {
            error!(error = %e, "Failed to serialize annotated document");
            PipelineError::Serialize(e)
        })?;
        debug!(size = bytes.len(), "Serialized annotated document");

        Ok(bytes)
    }
}
