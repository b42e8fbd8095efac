//! Page execution host abstraction.
//!
//! The harvester never talks to a browser or HTTP client directly. It asks
//! a `PageHost` for page contexts, drives them through `PageContext`, and
//! extracts from HTML snapshots. `HttpPageHost` is the shipped
//! implementation; tests inject in-memory hosts.

pub mod http;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use crate::collectors::PageSnapshot;
use crate::error::HarvestError;

pub use http::HttpPageHost;

/// Per-session state handed to the host when pages are opened.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub session_id: Uuid,
    /// Hosts refuse to open pages for a session that is no longer active.
    pub scraping_active: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            scraping_active: true,
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that can open pages and fetch documents.
#[async_trait]
pub trait PageHost: Send + Sync {
    /// Open a page context positioned at `url`. Nothing is loaded until the
    /// context's `wait_ready` is awaited.
    async fn open(
        &self,
        url: &str,
        session: &SessionContext,
    ) -> Result<Box<dyn PageContext>, HarvestError>;

    /// Fetch a document once, outside any page context.
    async fn fetch_html(&self, url: &str) -> Result<String, HarvestError>;
}

/// One page context (a tab), exclusively owned by the driver using it.
#[async_trait]
pub trait PageContext: Send + Sync {
    /// URL the context is positioned at.
    fn url(&self) -> &str;

    fn session(&self) -> &SessionContext;

    /// Cancelled when the context is destroyed from outside.
    fn closed(&self) -> CancellationToken;

    /// Point the context at a new URL.
    async fn navigate(&mut self, url: &str) -> Result<(), HarvestError>;

    /// Resolve once the current URL has loaded. Callers bound this with
    /// their own timeout.
    async fn wait_ready(&mut self) -> Result<(), HarvestError>;

    /// HTML of the loaded page.
    async fn snapshot(&self) -> Result<PageSnapshot, HarvestError>;

    async fn close(self: Box<Self>);
}
