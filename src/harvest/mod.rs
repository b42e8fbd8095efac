//! Harvest session controller.
//!
//! Sources are visited one at a time in the order given. Each runs its own
//! pagination driver against a page context it owns exclusively; every
//! extracted page is merged through the session's dedup index until the
//! budget is filled.

pub mod driver;
pub mod session;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::collectors::Platform;
use crate::enrich::DetailEnricher;
use crate::error::HarvestError;
use crate::host::PageHost;
use crate::models::job::JobRecord;

pub use driver::{DriverState, PageBatch, PaginationDriver};
pub use session::{ScrapeSession, SourceOutcome};

/// One starting URL to harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub url: String,
}

impl SourceSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: None,
            url: url.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            url: url.into(),
        }
    }

    /// Name used in progress reports and per-source counts: the explicit
    /// id, else the detected platform, else the URL itself.
    pub fn label(&self) -> String {
        match (&self.id, Platform::detect(&self.url)) {
            (Some(id), _) => id.clone(),
            (None, Some(platform)) => platform.name().to_string(),
            (None, None) => self.url.clone(),
        }
    }
}

/// Starting sources for a search term on each of `platforms`. Platforms
/// that do not serve `location` are skipped.
pub fn search_sources(query: &str, location: &str, platforms: &[Platform]) -> Vec<SourceSpec> {
    platforms
        .iter()
        .filter_map(|platform| {
            platform
                .search_url(query, location)
                .map(|url| SourceSpec::with_id(platform.name(), url))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Upper bound on a page becoming ready after navigation.
    pub load_timeout: Duration,
    /// Politeness delay before following a next-page link.
    pub page_delay: Duration,
    /// Fetch detail pages for records with missing fields.
    pub enrich: bool,
    pub max_pages: Option<u32>,
    /// Cancelling this ends the session; partial results are returned.
    pub cancel: CancellationToken,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(30),
            page_delay: Duration::from_secs(1),
            enrich: true,
            max_pages: None,
            cancel: CancellationToken::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestResult {
    pub session_id: Uuid,
    pub records: Vec<JobRecord>,
    pub per_source_counts: BTreeMap<String, usize>,
    pub sources: Vec<SourceOutcome>,
    pub cancelled: bool,
}

/// Harvest `sources` into at most `budget` deduplicated records.
///
/// `progress(source_id, page_number, items_so_far)` is invoked after each
/// page has been merged. Only an empty source list or a zero budget fail
/// the call; everything else is contained per record, page or source and
/// shows up in the returned outcomes.
pub async fn start_harvest<F>(
    host: &dyn PageHost,
    sources: &[SourceSpec],
    budget: usize,
    options: &HarvestOptions,
    mut progress: F,
) -> Result<HarvestResult, HarvestError>
where
    F: FnMut(&str, u32, usize) + Send,
{
    let mut session = ScrapeSession::new(sources, budget, options.cancel.child_token())?;
    tracing::info!(
        "Harvest {} started: {} sources, budget {budget}",
        session.id(),
        sources.len()
    );

    let enricher = DetailEnricher::new(host);
    for source in sources {
        if session.budget_reached() {
            tracing::info!("Budget of {budget} reached, skipping remaining sources");
            break;
        }
        if session.is_cancelled() {
            tracing::info!("Harvest {} cancelled, skipping remaining sources", session.id());
            break;
        }

        let outcome = run_source(host, &enricher, source, &mut session, options, &mut progress).await;
        tracing::info!(
            "Source '{}' finished: {} pages, {} records",
            outcome.source_id,
            outcome.pages,
            outcome.records
        );
        session.record_outcome(outcome);
    }

    let result = session.finish();
    tracing::info!(
        "Harvest {} finished: {} records, cancelled: {}",
        result.session_id,
        result.records.len(),
        result.cancelled
    );
    Ok(result)
}

async fn run_source<F>(
    host: &dyn PageHost,
    enricher: &DetailEnricher<'_>,
    source: &SourceSpec,
    session: &mut ScrapeSession,
    options: &HarvestOptions,
    progress: &mut F,
) -> SourceOutcome
where
    F: FnMut(&str, u32, usize) + Send,
{
    let mut outcome = SourceOutcome::new(source);

    let Some(platform) = Platform::detect(&source.url) else {
        let e = HarvestError::UnknownPlatform(source.url.clone());
        tracing::warn!("Source '{}': {e}", outcome.source_id);
        outcome.fault(&e);
        return outcome;
    };
    outcome.platform = Some(platform);

    let mut ctx = match host.open(&source.url, session.context()).await {
        Ok(ctx) => ctx,
        Err(HarvestError::ContextDestroyed) => {
            outcome.state = DriverState::Cancelled;
            return outcome;
        }
        Err(e) => {
            tracing::warn!("Could not open {}: {e}", source.url);
            outcome.fault(&e);
            return outcome;
        }
    };

    let mut driver = PaginationDriver::new(platform, options, session.cancel_token());
    loop {
        let batch = match driver.next_page(ctx.as_mut(), session.remaining()).await {
            Ok(Some(batch)) => batch,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Source '{}' fault: {e}", outcome.source_id);
                outcome.error = Some(e.to_string());
                break;
            }
        };

        for record in batch.records {
            if session.budget_reached() {
                break;
            }
            if !record.is_complete() {
                continue;
            }
            if session.is_duplicate(&record) {
                tracing::debug!("Duplicate {}", record.canonical_key());
                continue;
            }
            let record = if options.enrich {
                enricher.enrich(record).await
            } else {
                record
            };
            if session.admit(record) {
                outcome.records += 1;
            }
        }

        outcome.pages = batch.number;
        progress(&outcome.source_id, batch.number, session.items());
    }

    outcome.pages = driver.pages();
    outcome.state = driver.state().clone();
    if outcome.error.is_none() {
        outcome.error = driver.last_error().map(str::to_string);
    }
    ctx.close().await;
    outcome
}
