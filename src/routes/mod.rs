// HTTP routes: latest readings for scraping by a metrics backend

mod http;

use axum::{Router, routing::get};
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

use crate::models::MetricsReport;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) latest: watch::Receiver<MetricsReport>,
}

pub fn app(latest: watch::Receiver<MetricsReport>) -> Router {
    let state = AppState { latest };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/metrics", get(http::metrics_handler)) // GET /api/metrics
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
