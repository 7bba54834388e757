//! Health endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use crate::ports::SessionStore;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    session_store: &'static str,
}

/// GET /health - liveness plus a session store probe.
async fn health(State(store): State<Arc<dyn SessionStore>>) -> impl IntoResponse {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                session_store: "ok",
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded",
                session_store: "unavailable",
            }),
        ),
    }
}

/// Creates the health router.
pub fn health_routes(store: Arc<dyn SessionStore>) -> Router {
    Router::new().route("/health", get(health)).with_state(store)
}
