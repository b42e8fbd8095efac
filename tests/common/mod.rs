#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use jobharvest::error::HarvestError;
use jobharvest::harvest::HarvestOptions;
use jobharvest::host::{PageContext, PageHost, PageSnapshot, SessionContext};

/// In-memory page host serving canned HTML.
#[derive(Default)]
pub struct FixtureHost {
    pages: Arc<HashMap<String, String>>,
    details: HashMap<String, String>,
    /// Every URL a page context loaded, in order.
    pub loads: Arc<Mutex<Vec<String>>>,
    /// Every URL fetched outside a page context.
    pub fetches: Arc<Mutex<Vec<String>>>,
    /// Destroy each context after it has produced this many snapshots.
    pub destroy_after: Option<usize>,
}

impl FixtureHost {
    pub fn new<U: AsRef<str>>(pages: &[(U, String)]) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .iter()
                    .map(|(url, html)| (url.as_ref().to_string(), html.clone()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn with_detail(mut self, url: &str, html: &str) -> Self {
        self.details.insert(url.to_string(), html.to_string());
        self
    }

    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageHost for FixtureHost {
    async fn open(
        &self,
        url: &str,
        session: &SessionContext,
    ) -> Result<Box<dyn PageContext>, HarvestError> {
        Ok(Box::new(FixtureContext {
            pages: self.pages.clone(),
            loads: self.loads.clone(),
            session: session.clone(),
            url: url.to_string(),
            loaded: None,
            snapshots: Mutex::new(0),
            destroy_after: self.destroy_after,
            closed: CancellationToken::new(),
        }))
    }

    async fn fetch_html(&self, url: &str) -> Result<String, HarvestError> {
        self.fetches.lock().unwrap().push(url.to_string());
        self.details
            .get(url)
            .cloned()
            .ok_or_else(|| HarvestError::Navigation {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            })
    }
}

struct FixtureContext {
    pages: Arc<HashMap<String, String>>,
    loads: Arc<Mutex<Vec<String>>>,
    session: SessionContext,
    url: String,
    loaded: Option<String>,
    snapshots: Mutex<usize>,
    destroy_after: Option<usize>,
    closed: CancellationToken,
}

#[async_trait]
impl PageContext for FixtureContext {
    fn url(&self) -> &str {
        &self.url
    }

    fn session(&self) -> &SessionContext {
        &self.session
    }

    fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }

    async fn navigate(&mut self, url: &str) -> Result<(), HarvestError> {
        self.url = url.to_string();
        self.loaded = None;
        Ok(())
    }

    async fn wait_ready(&mut self) -> Result<(), HarvestError> {
        self.loads.lock().unwrap().push(self.url.clone());
        let html = self.pages.get(&self.url).ok_or_else(|| HarvestError::Navigation {
            url: self.url.clone(),
            reason: "HTTP 404 Not Found".to_string(),
        })?;
        self.loaded = Some(html.clone());
        Ok(())
    }

    async fn snapshot(&self) -> Result<PageSnapshot, HarvestError> {
        let snapshot = PageSnapshot {
            url: self.url.clone(),
            html: self.loaded.clone().unwrap_or_default(),
        };
        let taken = {
            let mut count = self.snapshots.lock().unwrap();
            *count += 1;
            *count
        };
        if self.destroy_after == Some(taken) {
            self.closed.cancel();
        }
        Ok(snapshot)
    }

    async fn close(self: Box<Self>) {
        self.closed.cancel();
    }
}

pub fn fast_options() -> HarvestOptions {
    HarvestOptions {
        load_timeout: Duration::from_secs(2),
        page_delay: Duration::ZERO,
        enrich: false,
        ..HarvestOptions::default()
    }
}

pub const SEEK_SEARCH: &str = "https://www.seek.com.au/rust-jobs/in-sydney";

pub fn seek_page_url(page: u32) -> String {
    if page == 1 {
        SEEK_SEARCH.to_string()
    } else {
        format!("{SEEK_SEARCH}?page={page}")
    }
}

pub fn seek_card(id: u32, title: &str, company: &str, location: &str) -> String {
    format!(
        r#"<article data-card-type="JobCard" data-job-id="{id}">
             <a data-testid="job-card-title" href="/job/{id}">{title}</a>
             <a data-automation="jobCompany">{company}</a>
             <span data-automation="jobCardLocation">{location}</span>
             <span data-automation="jobListingDate">2d ago</span>
           </article>"#
    )
}

/// A SEEK results page. `next` is the page number the next link points at.
pub fn seek_page(cards: &[String], next: Option<u32>) -> String {
    let next = next
        .map(|n| format!(r#"<a data-automation="page-next" href="?page={n}">Next</a>"#))
        .unwrap_or_default();
    format!(
        "<html><body><div>{}</div><nav>{next}</nav></body></html>",
        cards.concat()
    )
}
