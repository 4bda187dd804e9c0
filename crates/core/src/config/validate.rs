use secrecy::ExposeSecret;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Content server URL is http(s) and credentials are present
/// - Timeouts and retry policy are usable
/// - Node id and download name are sane
/// - Engine program is set
/// - Server port is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let cs = &config.content_server;

    if !(cs.url.starts_with("http://") || cs.url.starts_with("https://")) {
        return Err(invalid(format!(
            "content_server.url must be an http(s) URL, got '{}'",
            cs.url
        )));
    }
    if cs.username.trim().is_empty() {
        return Err(invalid("content_server.username cannot be empty"));
    }
    if cs.password.expose_secret().is_empty() {
        return Err(invalid("content_server.password cannot be empty"));
    }
    if cs.timeout_secs == 0 {
        return Err(invalid("content_server.timeout_secs cannot be 0"));
    }
    if cs.retry.max_attempts == 0 {
        return Err(invalid("content_server.retry.max_attempts must be at least 1"));
    }
    let multiplier = cs.retry.backoff_multiplier;
    if multiplier.is_nan() || multiplier < 1.0 {
        return Err(invalid(
            "content_server.retry.backoff_multiplier must be >= 1.0",
        ));
    }

    if config.document.node_id == 0 {
        return Err(invalid("document.node_id cannot be 0"));
    }
    let name = &config.document.download_name;
    if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
        return Err(invalid(
            "document.download_name must be a non-empty file stem without path separators",
        ));
    }

    if config.viewer.engine.program.as_os_str().is_empty() {
        return Err(invalid("viewer.engine.program cannot be empty"));
    }
    if config.viewer.engine.timeout_secs == 0 {
        return Err(invalid("viewer.engine.timeout_secs cannot be 0"));
    }
    if config.viewer.load_timeout_secs == 0 {
        return Err(invalid("viewer.load_timeout_secs cannot be 0"));
    }

    if config.pipeline.trigger_timeout_secs == 0 {
        return Err(invalid("pipeline.trigger_timeout_secs cannot be 0"));
    }

    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
