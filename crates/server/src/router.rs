use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .route("/tasks", get(api::tasks_list).post(api::tasks_create))
        .route(
            "/tasks/{id}",
            get(api::tasks_get)
                .put(api::tasks_update)
                .delete(api::tasks_delete),
        )
        .route("/tasks/{id}/done", post(api::tasks_done))
        .route("/tasks/{id}/postpone", post(api::tasks_postpone))
        .route("/devices", get(api::devices_list).post(api::devices_create))
        .route(
            "/devices/{id}",
            get(api::devices_get)
                .put(api::devices_update)
                .delete(api::devices_delete),
        )
        .route("/ha/action", post(api::ha_action))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
