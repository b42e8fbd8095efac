pub mod api;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::harvest::HarvestOptions;
use crate::host::PageHost;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub host: Arc<dyn PageHost>,
    pub options: HarvestOptions,
    /// SHA-256 of the bearer token guarding `/api/v1`, if any.
    pub api_token_hash: Option<String>,
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(api::router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
