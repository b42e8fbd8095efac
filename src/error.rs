use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Everything that can go wrong while harvesting.
///
/// Only `NoSources` and `InvalidBudget` ever escape `start_harvest`; the
/// rest are soft failures that end a single record, page or source and are
/// reported through tracing and the per-source outcomes.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("Extraction miss: {0}")]
    ExtractionMiss(String),

    #[error("Enrichment failed for {url}: {reason}")]
    EnrichmentFailure { url: String, reason: String },

    #[error("Page {url} was not ready within {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Page context destroyed")]
    ContextDestroyed,

    #[error("Source adapter fault: {0}")]
    SourceAdapterFault(String),

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No platform matches {0}")]
    UnknownPlatform(String),

    #[error("No sources supplied")]
    NoSources,

    #[error("Budget must be at least 1")]
    InvalidBudget,
}

impl HarvestError {
    /// Setup errors abort the session; everything else is contained.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarvestError::NoSources | HarvestError::InvalidBudget)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Harvest error: {0}")]
    Harvest(#[from] HarvestError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Harvest(e) if e.is_fatal() => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Harvest(e) => {
                tracing::error!("Harvest error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        };

        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
