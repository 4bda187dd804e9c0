pub mod config;
pub mod content_server;
pub mod document;
pub mod metrics;
pub mod operations;
pub mod pipeline;
pub mod session;
pub mod testing;
pub mod viewer;
pub mod workspace;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use content_server::{ContentServer, ContentServerError, NodeId, OtcsClient};
pub use document::{DocumentExtension, DocumentHandle, LoadState};
pub use operations::{
    CancelOutcome, Operation, OperationEvent, OperationId, OperationStatus, OperationTracker,
    Trigger,
};
pub use pipeline::{ActionOutcome, DownloadableFile, PipelineError, VersionReceipt};
pub use session::{Credentials, Session, Ticket};
pub use viewer::{ProcessViewerFactory, Viewer, ViewerError, ViewerFactory, ViewerUiState};
pub use workspace::{StartupError, Tracked, Workspace, WorkspaceStatus};
