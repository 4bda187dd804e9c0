use redline_core::{Config, SanitizedConfig, Workspace};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    workspace: Arc<Workspace>,
}

impl AppState {
    pub fn new(config: Config, workspace: Arc<Workspace>) -> Self {
        Self { config, workspace }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn workspace(&self) -> &Workspace {
        self.workspace.as_ref()
    }
}
