use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::HarvestOptions;
use crate::collectors::Platform;
use crate::error::HarvestError;
use crate::host::PageContext;
use crate::models::job::JobRecord;

/// Where a source's pagination currently stands. `Exhausted` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DriverState {
    NotStarted,
    LoadingPage { url: String },
    Extracting,
    HasNext { url: String },
    Exhausted,
    Cancelled,
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DriverState::Exhausted | DriverState::Cancelled)
    }
}

/// Records extracted from one page.
#[derive(Debug)]
pub struct PageBatch {
    /// 1-based page number within the source.
    pub number: u32,
    pub records: Vec<JobRecord>,
    pub next_page_url: Option<String>,
    pub misses: usize,
}

/// Per-source pagination state machine. Owns no page; the caller lends it
/// the source's context on every step.
pub struct PaginationDriver {
    platform: Platform,
    load_timeout: Duration,
    page_delay: Duration,
    max_pages: Option<u32>,
    cancel: CancellationToken,
    state: DriverState,
    pages: u32,
    last_error: Option<String>,
}

/// Resolves when either the page context or the session is torn down.
async fn destroyed(ctx: &CancellationToken, session: &CancellationToken) {
    tokio::select! {
        _ = ctx.cancelled() => {}
        _ = session.cancelled() => {}
    }
}

impl PaginationDriver {
    pub fn new(platform: Platform, options: &HarvestOptions, cancel: CancellationToken) -> Self {
        Self {
            platform,
            load_timeout: options.load_timeout,
            page_delay: options.page_delay,
            max_pages: options.max_pages,
            cancel,
            state: DriverState::NotStarted,
            pages: 0,
            last_error: None,
        }
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    /// Pages extracted so far.
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// The load or navigation failure that ended the source, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Run the state machine until one page has been extracted or the
    /// driver reaches a terminal state.
    ///
    /// `remaining` is the session budget left when the call is made; with
    /// nothing left the driver stops instead of loading another page.
    /// Timeouts, failed navigations and destroyed contexts end the source
    /// with `Ok(None)`; the first two are kept in `last_error`. Any other
    /// error leaves the driver `Exhausted` and is handed to the caller.
    pub async fn next_page(
        &mut self,
        ctx: &mut dyn PageContext,
        remaining: usize,
    ) -> Result<Option<PageBatch>, HarvestError> {
        let closed = ctx.closed();

        loop {
            match self.state.clone() {
                DriverState::Exhausted | DriverState::Cancelled => return Ok(None),

                DriverState::NotStarted => {
                    self.state = DriverState::LoadingPage {
                        url: ctx.url().to_string(),
                    };
                }

                DriverState::LoadingPage { url } => {
                    let loaded = tokio::select! {
                        biased;
                        _ = destroyed(&closed, &self.cancel) => Err(HarvestError::ContextDestroyed),
                        res = tokio::time::timeout(self.load_timeout, ctx.wait_ready()) => match res {
                            Ok(ready) => ready,
                            Err(_) => Err(HarvestError::NavigationTimeout {
                                url,
                                timeout: self.load_timeout,
                            }),
                        },
                    };
                    match loaded {
                        Ok(()) => self.state = DriverState::Extracting,
                        Err(e) => return self.halt(e),
                    }
                }

                DriverState::Extracting => {
                    let snapshot = match ctx.snapshot().await {
                        Ok(snapshot) => snapshot,
                        Err(e) => return self.halt(e),
                    };
                    let page = match self.platform.extract_listing_page(&snapshot, Utc::now()) {
                        Ok(page) => page,
                        Err(e) => return self.halt(e),
                    };
                    self.pages += 1;

                    tracing::info!(
                        "{} page {}: {} records, {} misses from {}",
                        self.platform,
                        self.pages,
                        page.records.len(),
                        page.misses,
                        snapshot.url
                    );

                    let capped = self.max_pages.is_some_and(|max| self.pages >= max);
                    self.state = match &page.next_page_url {
                        Some(next) if remaining > 0 && !capped && next != ctx.url() => {
                            DriverState::HasNext { url: next.clone() }
                        }
                        _ => DriverState::Exhausted,
                    };

                    return Ok(Some(PageBatch {
                        number: self.pages,
                        records: page.records,
                        next_page_url: page.next_page_url,
                        misses: page.misses,
                    }));
                }

                DriverState::HasNext { url } => {
                    if remaining == 0 {
                        self.state = DriverState::Exhausted;
                        return Ok(None);
                    }

                    let delayed = tokio::select! {
                        biased;
                        _ = destroyed(&closed, &self.cancel) => false,
                        _ = tokio::time::sleep(self.page_delay) => true,
                    };
                    if !delayed {
                        return self.halt(HarvestError::ContextDestroyed);
                    }

                    let navigated = tokio::select! {
                        biased;
                        _ = destroyed(&closed, &self.cancel) => Err(HarvestError::ContextDestroyed),
                        res = ctx.navigate(&url) => res,
                    };
                    match navigated {
                        Ok(()) => self.state = DriverState::LoadingPage { url },
                        Err(e) => return self.halt(e),
                    }
                }
            }
        }
    }

    /// Move to a terminal state for `e`.
    fn halt(&mut self, e: HarvestError) -> Result<Option<PageBatch>, HarvestError> {
        match e {
            HarvestError::ContextDestroyed => {
                tracing::info!(
                    "{} page context destroyed after {} pages, stopping",
                    self.platform,
                    self.pages
                );
                self.state = DriverState::Cancelled;
                Ok(None)
            }
            HarvestError::NavigationTimeout { .. } | HarvestError::Navigation { .. } => {
                tracing::warn!("{} stopped after {} pages: {e}", self.platform, self.pages);
                self.last_error = Some(e.to_string());
                self.state = DriverState::Exhausted;
                Ok(None)
            }
            other => {
                self.state = DriverState::Exhausted;
                Err(other)
            }
        }
    }
}
