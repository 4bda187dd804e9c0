//! Save-as-file and add-version triggers.

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use redline_core::{DownloadableFile, OperationId, PipelineError, VersionReceipt};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// Correlation id of the operation that produced a response.
pub const OPERATION_ID_HEADER: &str = "x-operation-id";

/// Hex SHA-256 of a downloaded body.
pub const CONTENT_SHA256_HEADER: &str = "x-content-sha256";

/// Non-standard "client closed request".
const STATUS_CANCELLED: u16 = 499;

/// Error response
#[derive(Debug, Serialize)]
pub struct TriggerErrorResponse {
    pub error: String,
    pub kind: &'static str,
    pub operation_id: OperationId,
}

/// Response for a created version
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub operation_id: OperationId,
    #[serde(flatten)]
    pub receipt: VersionReceipt,
}

fn status_for(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::NotLoaded => StatusCode::CONFLICT,
        PipelineError::UnknownAction(_) => StatusCode::NOT_FOUND,
        PipelineError::Cancelled => {
            StatusCode::from_u16(STATUS_CANCELLED).unwrap_or(StatusCode::REQUEST_TIMEOUT)
        }
        PipelineError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
        PipelineError::Upload(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Export(_) | PipelineError::Serialize(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn with_operation_id(mut response: Response, operation_id: OperationId) -> Response {
    if let Ok(value) = HeaderValue::from_str(&operation_id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(OPERATION_ID_HEADER), value);
    }
    response
}

pub(crate) fn error_response(operation_id: OperationId, error: &PipelineError) -> Response {
    let status = status_for(error);
    let body = TriggerErrorResponse {
        error: error.to_string(),
        kind: error.kind(),
        operation_id,
    };
    with_operation_id((status, Json(body)).into_response(), operation_id)
}

pub(crate) fn file_response(operation_id: OperationId, file: DownloadableFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    let mut response = (StatusCode::OK, file.bytes).into_response();

    let headers = response.headers_mut();
    match HeaderValue::from_str(&file.mime_type) {
        Ok(value) => {
            headers.insert(header::CONTENT_TYPE, value);
        }
        Err(e) => warn!(mime_type = %file.mime_type, error = %e, "Invalid MIME type"),
    }
    match HeaderValue::from_str(&disposition) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => warn!(file_name = %file.file_name, error = %e, "Invalid file name"),
    }
    if let Ok(value) = HeaderValue::from_str(&file.sha256) {
        headers.insert(HeaderName::from_static(CONTENT_SHA256_HEADER), value);
    }

    with_operation_id(response, operation_id)
}

pub(crate) fn version_response(operation_id: OperationId, receipt: VersionReceipt) -> Response {
    let body = VersionResponse {
        operation_id,
        receipt,
    };
    with_operation_id((StatusCode::CREATED, Json(body)).into_response(), operation_id)
}

/// Export annotations and return the annotated file as a download
pub async fn save_as_file(State(state): State<Arc<AppState>>) -> Response {
    let tracked = state.workspace().save_as_file().await;
    match tracked.result {
        Ok(file) => file_response(tracked.operation_id, file),
        Err(e) => error_response(tracked.operation_id, &e),
    }
}

/// Export annotations and upload the annotated file as a new version
pub async fn add_version(State(state): State<Arc<AppState>>) -> Response {
    let tracked = state.workspace().add_version().await;
    match tracked.result {
        Ok(receipt) => version_response(tracked.operation_id, receipt),
        Err(e) => error_response(tracked.operation_id, &e),
    }
}
