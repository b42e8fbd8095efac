use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{PageContext, PageHost, PageSnapshot, SessionContext};
use crate::error::HarvestError;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Page host backed by plain HTTP GETs. Pages are fetched, not rendered,
/// so only server-rendered listings are visible.
#[derive(Clone)]
pub struct HttpPageHost {
    client: reqwest::Client,
    fetch_timeout: Duration,
    shutdown: CancellationToken,
}

impl HttpPageHost {
    pub fn new(fetch_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            fetch_timeout,
            shutdown: CancellationToken::new(),
        })
    }

    /// Cancelling this token destroys every context the host has opened.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

/// GET `url` and return the body with the final URL after redirects.
async fn get(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<(String, String), HarvestError> {
    let resp = client
        .get(url)
        .header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Sec-Fetch-Dest", "document")
        .header("Sec-Fetch-Mode", "navigate")
        .header("Sec-Fetch-Site", "none")
        .send()
        .await
        .map_err(|e| transport_error(url, timeout, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(HarvestError::Navigation {
            url: url.to_string(),
            reason: format!("HTTP {status}"),
        });
    }

    let final_url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|e| transport_error(url, timeout, e))?;
    Ok((final_url, body))
}

fn transport_error(url: &str, timeout: Duration, e: reqwest::Error) -> HarvestError {
    if e.is_timeout() {
        HarvestError::NavigationTimeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        HarvestError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl PageHost for HttpPageHost {
    async fn open(
        &self,
        url: &str,
        session: &SessionContext,
    ) -> Result<Box<dyn PageContext>, HarvestError> {
        if !session.scraping_active || self.shutdown.is_cancelled() {
            return Err(HarvestError::ContextDestroyed);
        }
        tracing::debug!("Opening page context at {url} for session {}", session.session_id);

        Ok(Box::new(HttpPageContext {
            client: self.client.clone(),
            fetch_timeout: self.fetch_timeout,
            session: session.clone(),
            url: url.to_string(),
            html: None,
            closed: self.shutdown.child_token(),
        }))
    }

    async fn fetch_html(&self, url: &str) -> Result<String, HarvestError> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(HarvestError::ContextDestroyed),
            res = get(&self.client, url, self.fetch_timeout) => res.map(|(_, body)| body),
        }
    }
}

struct HttpPageContext {
    client: reqwest::Client,
    fetch_timeout: Duration,
    session: SessionContext,
    url: String,
    html: Option<String>,
    closed: CancellationToken,
}

#[async_trait]
impl PageContext for HttpPageContext {
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
        if self.closed.is_cancelled() {
            return Err(HarvestError::ContextDestroyed);
        }
        self.url = url.to_string();
        self.html = None;
        Ok(())
    }

    async fn wait_ready(&mut self) -> Result<(), HarvestError> {
        let (final_url, body) = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(HarvestError::ContextDestroyed),
            res = get(&self.client, &self.url, self.fetch_timeout) => res?,
        };
        self.url = final_url;
        self.html = Some(body);
        Ok(())
    }

    async fn snapshot(&self) -> Result<PageSnapshot, HarvestError> {
        if self.closed.is_cancelled() {
            return Err(HarvestError::ContextDestroyed);
        }
        let html = self.html.clone().ok_or_else(|| {
            HarvestError::SourceAdapterFault(format!("No document loaded for {}", self.url))
        })?;
        Ok(PageSnapshot {
            url: self.url.clone(),
            html,
        })
    }

    async fn close(self: Box<Self>) {
        self.closed.cancel();
    }
}
