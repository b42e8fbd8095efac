//! Detail-page enrichment of incomplete records.

use chrono::Utc;

use crate::collectors::PageSnapshot;
use crate::error::HarvestError;
use crate::host::PageHost;
use crate::models::job::{JobDetail, JobRecord, MissingFields};

pub struct DetailEnricher<'a> {
    host: &'a dyn PageHost,
}

impl<'a> DetailEnricher<'a> {
    pub fn new(host: &'a dyn PageHost) -> Self {
        Self { host }
    }

    /// Fill the record's missing salary, job type, description or posting
    /// date from its detail page. One fetch, no retry. Any failure leaves
    /// the record as it was.
    pub async fn enrich(&self, mut record: JobRecord) -> JobRecord {
        let wanted = record.missing_fields();
        if !wanted.any() || record.source_url.is_empty() {
            return record;
        }

        match self.fetch_detail(&record, wanted).await {
            Ok(detail) => {
                let filled = record.merge_detail(detail);
                tracing::debug!("Enriched {} ({filled} fields)", record.source_url);
            }
            Err(e) => tracing::warn!("{e}"),
        }
        record
    }

    async fn fetch_detail(
        &self,
        record: &JobRecord,
        wanted: MissingFields,
    ) -> Result<JobDetail, HarvestError> {
        let failure = |reason: String| HarvestError::EnrichmentFailure {
            url: record.source_url.clone(),
            reason,
        };

        let html = self
            .host
            .fetch_html(&record.source_url)
            .await
            .map_err(|e| failure(e.to_string()))?;
        let snapshot = PageSnapshot {
            url: record.source_url.clone(),
            html,
        };
        record
            .source_platform
            .extract_detail(&snapshot, wanted, Utc::now())
            .map_err(|e| failure(e.to_string()))
    }
}
