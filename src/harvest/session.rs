use std::collections::BTreeMap;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::driver::DriverState;
use super::{HarvestResult, SourceSpec};
use crate::collectors::Platform;
use crate::dedup::DedupIndex;
use crate::error::HarvestError;
use crate::host::SessionContext;
use crate::models::job::JobRecord;

/// How one requested source ended.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOutcome {
    pub source_id: String,
    pub url: String,
    pub platform: Option<Platform>,
    pub pages: u32,
    /// Records this source added to the result set.
    pub records: usize,
    pub state: DriverState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn new(source: &SourceSpec) -> Self {
        Self {
            source_id: source.label(),
            url: source.url.clone(),
            platform: None,
            pages: 0,
            records: 0,
            state: DriverState::NotStarted,
            error: None,
        }
    }

    /// Record a source-level fault; the source counts as exhausted.
    pub fn fault(&mut self, e: &HarvestError) {
        self.state = DriverState::Exhausted;
        self.error = Some(e.to_string());
    }
}

/// State of one harvest call. Lives only for the duration of
/// `start_harvest`.
pub struct ScrapeSession {
    context: SessionContext,
    budget: usize,
    index: DedupIndex,
    outcomes: Vec<SourceOutcome>,
    cancel: CancellationToken,
}

impl ScrapeSession {
    pub fn new(
        sources: &[SourceSpec],
        budget: usize,
        cancel: CancellationToken,
    ) -> Result<Self, HarvestError> {
        if sources.is_empty() {
            return Err(HarvestError::NoSources);
        }
        if budget == 0 {
            return Err(HarvestError::InvalidBudget);
        }

        Ok(Self {
            context: SessionContext::new(),
            budget,
            index: DedupIndex::new(),
            outcomes: Vec::with_capacity(sources.len()),
            cancel,
        })
    }

    pub fn id(&self) -> Uuid {
        self.context.session_id
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn items(&self) -> usize {
        self.index.len()
    }

    pub fn remaining(&self) -> usize {
        self.budget.saturating_sub(self.index.len())
    }

    pub fn budget_reached(&self) -> bool {
        self.remaining() == 0
    }

    pub fn is_duplicate(&self, record: &JobRecord) -> bool {
        self.index.contains(record)
    }

    /// Insert a record if the budget allows and its key is new.
    pub fn admit(&mut self, record: JobRecord) -> bool {
        !self.budget_reached() && self.index.insert(record)
    }

    pub fn record_outcome(&mut self, outcome: SourceOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(mut self) -> HarvestResult {
        self.context.scraping_active = false;

        let mut per_source_counts = BTreeMap::new();
        for outcome in &self.outcomes {
            *per_source_counts.entry(outcome.source_id.clone()).or_insert(0) += outcome.records;
        }

        HarvestResult {
            session_id: self.context.session_id,
            cancelled: self.cancel.is_cancelled(),
            records: self.index.into_records(),
            per_source_counts,
            sources: self.outcomes,
        }
    }
}
