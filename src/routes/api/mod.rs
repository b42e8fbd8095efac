pub mod harvest;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::auth::require_api_token;
use crate::routes::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/platforms", get(harvest::platforms))
        .route("/harvest", post(harvest::harvest))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_token,
        ))
        .with_state(state);

    Router::new().nest("/api/v1", protected)
}
