// GET handlers: version, api/metrics

use axum::{extract::State, response::IntoResponse};

use super::AppState;

/// GET /version: package name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/metrics: the report published by the last sampling tick.
pub(super) async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.latest.borrow().clone();
    axum::Json(report)
}
