use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::collectors::Platform;
use crate::error::AppError;
use crate::harvest::{self, HarvestResult, SourceSpec};
use crate::routes::AppState;

pub const DEFAULT_BUDGET: usize = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestRequest {
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
    pub query: Option<String>,
    pub location: Option<String>,
    /// Platforms to search when `query` is given; all when empty.
    #[serde(default)]
    pub platforms: Vec<Platform>,
    pub budget: Option<usize>,
}

impl HarvestRequest {
    /// Explicit sources first, then search URLs built from the query.
    fn resolve_sources(&self) -> Vec<SourceSpec> {
        let mut sources = self.sources.clone();
        if let Some(query) = self.query.as_deref().map(str::trim)
            && !query.is_empty()
        {
            let platforms = if self.platforms.is_empty() {
                &Platform::ALL[..]
            } else {
                &self.platforms[..]
            };
            let location = self.location.as_deref().unwrap_or_default();
            sources.extend(harvest::search_sources(query, location, platforms));
        }
        sources
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    pub name: &'static str,
    pub display_name: &'static str,
}

/// GET /api/v1/platforms
pub async fn platforms() -> Json<Vec<PlatformInfo>> {
    Json(
        Platform::ALL
            .iter()
            .map(|p| PlatformInfo {
                name: p.name(),
                display_name: p.display_name(),
            })
            .collect(),
    )
}

/// POST /api/v1/harvest
///
/// Runs a full harvest and answers with the result. Needs at least one
/// explicit source or a search query.
pub async fn harvest(
    State(state): State<AppState>,
    Json(input): Json<HarvestRequest>,
) -> Result<Json<HarvestResult>, AppError> {
    let sources = input.resolve_sources();
    if sources.is_empty() {
        return Err(AppError::BadRequest(
            "Provide sources or a query for a served location".to_string(),
        ));
    }

    let budget = input.budget.unwrap_or(DEFAULT_BUDGET);
    let result = harvest::start_harvest(
        state.host.as_ref(),
        &sources,
        budget,
        &state.options,
        |source, page, items| {
            tracing::debug!("Source '{source}' page {page}: {items} records so far");
        },
    )
    .await?;

    Ok(Json(result))
}
