use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub content_server: ContentServerConfig,
    pub document: DocumentConfig,
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8080
}

/// Content server connection and login settings
#[derive(Debug, Clone, Deserialize)]
pub struct ContentServerConfig {
    /// Base URL up to and including the CGI path (e.g., "http://host/otcs/cs.exe")
    pub url: String,
    pub username: String,
    pub password: Secret<String>,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_request_timeout() -> u64 {
    30
}

/// Retry policy for transient content server failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for a single delay in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> u64 {
    200
}

fn default_max_delay() -> u64 {
    5_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// The document this instance edits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentConfig {
    /// Content server node id
    pub node_id: u64,
    /// File stem offered for downloads; the extension follows the document type
    #[serde(default = "default_download_name")]
    pub download_name: String,
}

fn default_download_name() -> String {
    "document".to_string()
}

/// Viewer embedding settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewerConfig {
    /// Location of the viewer library assets, handed to the engine as `{lib}`
    #[serde(default = "default_library_path")]
    pub library_path: PathBuf,
    /// Directory the viewer is mounted into (documents are staged here)
    #[serde(default = "default_mount_dir")]
    pub mount_dir: PathBuf,
    /// Built-in UI elements hidden after the viewer starts
    #[serde(default = "default_disabled_elements")]
    pub disabled_elements: Vec<String>,
    /// How long startup waits for the document-loaded event
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
    pub engine: EngineConfig,
}

fn default_library_path() -> PathBuf {
    PathBuf::from("lib")
}

fn default_mount_dir() -> PathBuf {
    std::env::temp_dir().join("redline-viewer")
}

pub const DEFAULT_DISABLED_ELEMENTS: [&str; 4] = [
    "leftPanel",
    "leftPanelButton",
    "menuButton",
    "viewControlsButton",
];

fn default_disabled_elements() -> Vec<String> {
    DEFAULT_DISABLED_ELEMENTS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_load_timeout() -> u64 {
    30
}

/// External annotation engine driven by the process viewer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Engine executable
    pub program: PathBuf,
    /// Arguments for annotation export; stdout carries the XFDF.
    /// Placeholders: `{lib}`, `{input}`.
    #[serde(default = "default_export_args")]
    pub export_args: Vec<String>,
    /// Arguments for re-serialization with annotations.
    /// Placeholders: `{lib}`, `{input}`, `{xfdf}`, `{output}`.
    #[serde(default = "default_merge_args")]
    pub merge_args: Vec<String>,
    /// Timeout for a single engine run in seconds (default: 120)
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

fn default_export_args() -> Vec<String> {
    ["export", "--lib", "{lib}", "{input}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_merge_args() -> Vec<String> {
    ["merge", "--lib", "{lib}", "{input}", "{xfdf}", "{output}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_engine_timeout() -> u64 {
    120
}

/// Trigger execution settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Overall bound for one save/add-version trigger in seconds
    #[serde(default = "default_trigger_timeout")]
    pub trigger_timeout_secs: u64,
}

fn default_trigger_timeout() -> u64 {
    300
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            trigger_timeout_secs: default_trigger_timeout(),
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub content_server: SanitizedContentServerConfig,
    pub document: DocumentConfig,
    pub viewer: ViewerConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

/// Content server settings with the password hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedContentServerConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let cs = &config.content_server;
        Self {
            content_server: SanitizedContentServerConfig {
                url: cs.url.clone(),
                username: cs.username.clone(),
                password_configured: !cs.password.expose_secret().is_empty(),
                timeout_secs: cs.timeout_secs,
                retry: cs.retry.clone(),
            },
            document: config.document.clone(),
            viewer: config.viewer.clone(),
            pipeline: config.pipeline.clone(),
            server: config.server.clone(),
        }
    }
}
