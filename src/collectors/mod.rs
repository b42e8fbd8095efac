// Source platforms: selector tables, URL predicates and pagination rules
// for each supported job board, behind a closed enum.

mod indeed;
mod linkedin;
mod seek;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::error::HarvestError;
use crate::extract::{self, DetailSelectors, ExtractContext, ListingSelectors};
use crate::models::job::{JobDetail, JobRecord, MissingFields};

/// Characters that encodeURIComponent does NOT encode.
/// RFC 3986 unreserved: A-Z a-z 0-9 - _ . ! ~ * ' ( )
const ENCODE_URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// URL-encode a string for use in query parameters.
fn urlencoded(s: &str) -> String {
    utf8_percent_encode(s, ENCODE_URI_COMPONENT_SET).to_string()
}

/// Lowercase, hyphen-joined path segment ("Gold Coast" → "gold-coast").
fn slug(s: &str) -> String {
    let joined = s.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase();
    utf8_percent_encode(&joined, ENCODE_URI_COMPONENT_SET).to_string()
}

/// A job board the harvester knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    LinkedIn,
    Seek,
    Indeed,
}

/// HTML of a loaded page together with the URL it was loaded from.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

/// Result of reading one page of search results.
#[derive(Debug, Default)]
pub struct ListingPage {
    pub records: Vec<JobRecord>,
    pub next_page_url: Option<String>,
    /// Entries dropped for lacking required fields.
    pub misses: usize,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::LinkedIn, Platform::Seek, Platform::Indeed];

    pub fn name(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::Seek => "seek",
            Platform::Indeed => "indeed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Seek => "SEEK",
            Platform::Indeed => "Indeed",
        }
    }

    /// URL predicate used for dispatch.
    pub fn matches(&self, url: &str) -> bool {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
            .unwrap_or_default();
        let on = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));
        match self {
            Platform::LinkedIn => on("linkedin.com"),
            Platform::Seek => on("seek.com.au") || on("seek.co.nz"),
            Platform::Indeed => indeed::DOMAINS.into_iter().any(on),
        }
    }

    /// First platform whose predicate accepts `url`.
    pub fn detect(url: &str) -> Option<Platform> {
        Platform::ALL.into_iter().find(|p| p.matches(url))
    }

    pub fn from_name(name: &str) -> Option<Platform> {
        let name = name.trim();
        Platform::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name) || p.display_name().eq_ignore_ascii_case(name))
    }

    fn listing_selectors(&self) -> &'static ListingSelectors {
        match self {
            Platform::LinkedIn => &linkedin::LISTING,
            Platform::Seek => &seek::LISTING,
            Platform::Indeed => &indeed::LISTING,
        }
    }

    fn detail_selectors(&self) -> &'static DetailSelectors {
        match self {
            Platform::LinkedIn => &linkedin::DETAIL,
            Platform::Seek => &seek::DETAIL,
            Platform::Indeed => &indeed::DETAIL,
        }
    }

    fn next_page_url(&self, document: &Html, ctx: &ExtractContext) -> Result<Option<String>, HarvestError> {
        match self {
            Platform::LinkedIn => linkedin::next_page_url(document, ctx),
            Platform::Seek => seek::next_page_url(document, ctx),
            Platform::Indeed => indeed::next_page_url(document, ctx),
        }
    }

    /// Read every acceptable record and the next page URL from a results
    /// page. Missing fields drop single entries; only a broken selector
    /// table or an unusable page URL is an error.
    pub fn extract_listing_page(
        &self,
        snapshot: &PageSnapshot,
        now: DateTime<Utc>,
    ) -> Result<ListingPage, HarvestError> {
        let ctx = ExtractContext::new(*self, &snapshot.url, now)?;
        let document = Html::parse_document(&snapshot.html);

        if *self == Platform::LinkedIn && linkedin::is_login_wall(&document)? {
            tracing::warn!("LinkedIn served a login wall at {}", snapshot.url);
            return Ok(ListingPage::default());
        }

        let extracted = extract::extract_listings(&document, self.listing_selectors(), &ctx)?;
        let next_page_url = self
            .next_page_url(&document, &ctx)?
            .filter(|next| next != &snapshot.url);

        Ok(ListingPage {
            records: extracted.records,
            next_page_url,
            misses: extracted.misses,
        })
    }

    /// Read the `wanted` fields from a job's detail page.
    pub fn extract_detail(
        &self,
        snapshot: &PageSnapshot,
        wanted: MissingFields,
        now: DateTime<Utc>,
    ) -> Result<JobDetail, HarvestError> {
        let ctx = ExtractContext::new(*self, &snapshot.url, now)?;
        let document = Html::parse_document(&snapshot.html);
        extract::extract_detail(&document, self.detail_selectors(), wanted, &ctx)
    }

    /// Starting search URL for `term` around `location`. `None` when the
    /// platform does not serve that region.
    pub fn search_url(&self, term: &str, location: &str) -> Option<String> {
        match self {
            Platform::LinkedIn => Some(format!(
                "https://www.linkedin.com/jobs/search?keywords={}&location={}",
                urlencoded(term),
                urlencoded(location)
            )),
            Platform::Indeed => {
                let domain = indeed::regional_domain(location);
                let city = location.split(',').next().unwrap_or_default().trim();
                Some(format!(
                    "https://{domain}/jobs?q={}&l={}",
                    urlencoded(term),
                    urlencoded(city)
                ))
            }
            Platform::Seek => {
                let domain = seek::regional_domain(location)?;
                let city = location.split(',').next().unwrap_or_default();
                Some(format!("https://{domain}/{}-jobs/in-{}", slug(term), slug(city)))
            }
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Platform {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::from_name(s).ok_or_else(|| HarvestError::UnknownPlatform(s.to_string()))
    }
}
