//! Testing utilities and mock implementations for lifecycle tests.
//!
//! This module provides mock implementations of the external collaborator
//! traits, so the whole startup sequence and both triggers can be exercised
//! without a content server or a viewer engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use redline_core::testing::{MockContentServer, MockViewerFactory};
//!
//! let server = Arc::new(MockContentServer::new());
//! server.set_ticket("T1").await;
//! let factory = MockViewerFactory::new();
//!
//! let workspace = Workspace::start(&config, server.clone(), &factory).await?;
//! ```

mod mock_content_server;
mod mock_viewer;

pub use mock_content_server::{
    MockContentServer, RecordedFetch, RecordedUpload, MOCK_BASE_URL,
};
pub use mock_viewer::{MockViewer, MockViewerFactory};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::{load_config_from_str, Config};

    /// A complete configuration pointing at `url`, editing `node_id`.
    pub fn config(url: &str, node_id: u64) -> Config {
        let toml = format!(
            r#"
[content_server]
url = "{url}"
username = "admin"
password = "secret"

[content_server.retry]
max_attempts = 2
initial_delay_ms = 1
max_delay_ms = 5

[document]
node_id = {node_id}

[viewer]
mount_dir = "/tmp/redline-test-viewer"
load_timeout_secs = 5

[viewer.engine]
program = "annotation-engine"

[pipeline]
trigger_timeout_secs = 5
"#
        );
        // Fixture input is static and known to be valid.
        load_config_from_str(&toml).unwrap()
    }

    /// Minimal PDF-looking body.
    pub fn pdf_bytes() -> Vec<u8> {
        b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n%%EOF".to_vec()
    }
}
