//! Operation status and cancellation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use redline_core::{CancelOutcome, Operation, OperationId};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Error response
#[derive(Debug, Serialize)]
pub struct OperationErrorResponse {
    pub error: String,
}

/// Response for listing operations
#[derive(Debug, Serialize)]
pub struct ListOperationsResponse {
    pub operations: Vec<Operation>,
    pub total: usize,
}

type OperationError = (StatusCode, Json<OperationErrorResponse>);

fn error(status: StatusCode, message: String) -> OperationError {
    (status, Json(OperationErrorResponse { error: message }))
}

fn parse_id(id: &str) -> Result<OperationId, OperationError> {
    id.parse()
        .map_err(|_| error(StatusCode::BAD_REQUEST, format!("Invalid operation id: {}", id)))
}

/// List recent operations, newest first
pub async fn list_operations(State(state): State<Arc<AppState>>) -> Json<ListOperationsResponse> {
    let operations = state.workspace().tracker().list().await;
    Json(ListOperationsResponse {
        total: operations.len(),
        operations,
    })
}

/// Get an operation by ID
pub async fn get_operation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Operation>, OperationError> {
    let operation_id = parse_id(&id)?;
    match state.workspace().tracker().get(operation_id).await {
        Some(operation) => Ok(Json(operation)),
        None => Err(error(
            StatusCode::NOT_FOUND,
            format!("Operation not found: {}", id),
        )),
    }
}

/// Cancel an in-flight operation (DELETE endpoint)
pub async fn cancel_operation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Operation>), OperationError> {
    let operation_id = parse_id(&id)?;
    let tracker = state.workspace().tracker();

    match tracker.cancel(operation_id).await {
        CancelOutcome::Requested => match tracker.get(operation_id).await {
            Some(operation) => Ok((StatusCode::ACCEPTED, Json(operation))),
            None => Err(error(
                StatusCode::NOT_FOUND,
                format!("Operation not found: {}", id),
            )),
        },
        CancelOutcome::AlreadyFinished => Err(error(
            StatusCode::CONFLICT,
            format!("Operation already finished: {}", id),
        )),
        CancelOutcome::NotFound => Err(error(
            StatusCode::NOT_FOUND,
            format!("Operation not found: {}", id),
        )),
    }
}
