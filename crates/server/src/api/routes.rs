use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{document, handlers, middleware::metrics_middleware, operations, viewer, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and status
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        // Viewer
        .route("/viewer", get(viewer::get_viewer))
        .route("/viewer/actions/{id}", post(viewer::run_action))
        // Triggers
        .route("/document/save", post(document::save_as_file))
        .route("/document/versions", post(document::add_version))
        // Operations
        .route("/operations", get(operations::list_operations))
        .route(
            "/operations/{id}",
            get(operations::get_operation).delete(operations::cancel_operation),
        )
        .route("/ws", get(ws::ws_handler))
        .with_state(Arc::clone(&state));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
