//! Viewer UI state and header actions.

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use redline_core::{ActionOutcome, ViewerUiState};
use std::sync::Arc;

use super::document::{error_response, file_response, version_response};
use crate::state::AppState;

/// Disabled elements and registered header items
pub async fn get_viewer(State(state): State<Arc<AppState>>) -> Json<ViewerUiState> {
    Json(state.workspace().viewer_ui_state())
}

/// Run the action bound to a header item
pub async fn run_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let tracked = state.workspace().run_header_action(&id).await;
    match tracked.result {
        Ok(ActionOutcome::Saved(file)) => file_response(tracked.operation_id, file),
        Ok(ActionOutcome::Uploaded(receipt)) => version_response(tracked.operation_id, receipt),
        Err(e) => error_response(tracked.operation_id, &e),
    }
}
