//! Selector-driven extraction of job records from listing and detail pages.
//!
//! Every field is described by an ordered list of CSS selectors; the first
//! candidate that yields non-empty text wins. Markup on the source sites
//! changes without notice, so a miss on an optional field is never an
//! error and a miss on a required field only drops that one entry.

pub mod classify;
pub mod dates;

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::collectors::Platform;
use crate::error::HarvestError;
use crate::models::job::{JobDetail, JobRecord, JobStatus, MissingFields};

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{5,}").expect("digit run pattern"));

/// Ordered selectors for one text field.
#[derive(Debug, Clone, Copy)]
pub struct TextField {
    pub selectors: &'static [&'static str],
    /// Keep only the first non-empty line of the element text.
    pub first_line: bool,
}

impl TextField {
    pub const fn new(selectors: &'static [&'static str]) -> Self {
        Self {
            selectors,
            first_line: false,
        }
    }

    pub const fn first_line(selectors: &'static [&'static str]) -> Self {
        Self {
            selectors,
            first_line: true,
        }
    }
}

/// An attribute read from a selector match, or from the card itself when
/// `selector` is `None`.
#[derive(Debug, Clone, Copy)]
pub struct AttrSource {
    pub selector: Option<&'static str>,
    pub attr: &'static str,
}

impl AttrSource {
    pub const fn on(selector: &'static str, attr: &'static str) -> Self {
        Self {
            selector: Some(selector),
            attr,
        }
    }

    pub const fn own(attr: &'static str) -> Self {
        Self {
            selector: None,
            attr,
        }
    }
}

/// Selector table for a search results page.
#[derive(Debug, Clone, Copy)]
pub struct ListingSelectors {
    /// Card containers; the first selector with any match wins.
    pub cards: &'static [&'static str],
    pub title: TextField,
    pub company: TextField,
    pub location: TextField,
    pub description: TextField,
    pub posted: TextField,
    /// Pool of metadata fragments classified into salary and job type.
    pub metadata: &'static [&'static str],
    /// Fragments are cut at this character ("Health insurance +1").
    pub metadata_cut: Option<char>,
    pub link: &'static [AttrSource],
    pub logo: &'static [AttrSource],
    pub source_id: &'static [AttrSource],
}

/// Selector table for a single job's detail page.
#[derive(Debug, Clone, Copy)]
pub struct DetailSelectors {
    pub salary: &'static [&'static str],
    pub job_type: &'static [&'static str],
    pub description: &'static [&'static str],
    pub posted: &'static [&'static str],
}

/// Where and when a page is being extracted.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub platform: Platform,
    pub page_url: Url,
    pub now: DateTime<Utc>,
}

impl ExtractContext {
    pub fn new(platform: Platform, page_url: &str, now: DateTime<Utc>) -> Result<Self, HarvestError> {
        let page_url = Url::parse(page_url).map_err(|e| {
            HarvestError::SourceAdapterFault(format!("Invalid page URL '{page_url}': {e}"))
        })?;
        Ok(Self {
            platform,
            page_url,
            now,
        })
    }

    /// Resolve a possibly relative link against the page URL.
    pub fn absolute(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }
        self.page_url.join(href).ok().map(String::from)
    }
}

/// Records that survived extraction plus how many entries were dropped.
#[derive(Debug, Default)]
pub struct ExtractedListings {
    pub records: Vec<JobRecord>,
    pub misses: usize,
}

/// Trim, collapse runs of whitespace and strip trailing ellipses.
pub fn clean_text(raw: &str) -> String {
    let mut text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    loop {
        let stripped = text.trim_end_matches('…').trim_end_matches("...").trim_end();
        if stripped.len() == text.len() {
            break;
        }
        text = stripped.to_string();
    }
    text
}

/// Compile a selector group, skipping invalid entries. Fails only when
/// nothing in a non-empty group compiles.
pub fn compile_group(group: &[&str]) -> Result<Vec<Selector>, HarvestError> {
    let mut compiled = Vec::with_capacity(group.len());
    let mut last_error = None;

    for raw in group {
        match Selector::parse(raw) {
            Ok(selector) => compiled.push(selector),
            Err(e) => {
                tracing::warn!("Skipping invalid selector '{raw}': {e}");
                last_error = Some(HarvestError::InvalidSelector {
                    selector: raw.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    match last_error {
        Some(e) if compiled.is_empty() => Err(e),
        _ => Ok(compiled),
    }
}

struct CompiledText {
    selectors: Vec<Selector>,
    first_line: bool,
}

impl CompiledText {
    fn compile(field: &TextField) -> Result<Self, HarvestError> {
        Ok(Self {
            selectors: compile_group(field.selectors)?,
            first_line: field.first_line,
        })
    }

    fn resolve(&self, scope: ElementRef<'_>) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            scope
                .select(selector)
                .find_map(|el| element_text(el, self.first_line))
        })
    }
}

struct CompiledAttr {
    selector: Option<Selector>,
    attr: &'static str,
}

fn compile_attrs(sources: &[AttrSource]) -> Result<Vec<CompiledAttr>, HarvestError> {
    let mut compiled = Vec::with_capacity(sources.len());
    for source in sources {
        let selector = match source.selector {
            Some(raw) => match compile_group(&[raw]) {
                Ok(mut group) => group.pop(),
                Err(_) if sources.len() > 1 => continue,
                Err(e) => return Err(e),
            },
            None => None,
        };
        compiled.push(CompiledAttr {
            selector,
            attr: source.attr,
        });
    }
    Ok(compiled)
}

fn resolve_attr(scope: ElementRef<'_>, sources: &[CompiledAttr]) -> Option<String> {
    sources.iter().find_map(|source| {
        let value = match &source.selector {
            Some(selector) => scope
                .select(selector)
                .find_map(|el| el.value().attr(source.attr).map(str::trim).filter(|v| !v.is_empty())),
            None => scope.value().attr(source.attr).map(str::trim).filter(|v| !v.is_empty()),
        };
        value.map(str::to_string)
    })
}

/// Element text with `textContent` semantics, cleaned.
pub fn element_text(el: ElementRef<'_>, first_line: bool) -> Option<String> {
    let raw: String = el.text().collect();
    let raw = if first_line {
        raw.lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string()
    } else {
        raw
    };
    let cleaned = clean_text(&raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Metadata chips often nest an icon label or "+1" suffix; prefer the
/// element's own text nodes and cut at the platform's marker.
fn fragment_text(el: ElementRef<'_>, cut: Option<char>) -> Option<String> {
    let own = el
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let text = if own.is_empty() {
        el.text().collect::<String>()
    } else {
        own
    };
    let text = match cut {
        Some(marker) => text.split(marker).next().unwrap_or_default().to_string(),
        None => text,
    };
    let cleaned = clean_text(&text);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// True when a pagination control is present but switched off.
pub fn is_inert(el: ElementRef<'_>) -> bool {
    let value = el.value();
    value.attr("aria-hidden") == Some("true")
        || value.attr("aria-disabled") == Some("true")
        || value.attr("disabled").is_some()
        || value.attr("hidden").is_some()
        || value
            .attr("class")
            .is_some_and(|class| class.split_whitespace().any(|c| c.contains("disabled")))
}

/// First live "next" link among `selectors`, resolved to an absolute URL.
pub fn follow_next_link(
    document: &Html,
    selectors: &[&str],
    ctx: &ExtractContext,
) -> Result<Option<String>, HarvestError> {
    let compiled = compile_group(selectors)?;
    Ok(compiled.iter().find_map(|selector| {
        document
            .select(selector)
            .filter(|el| !is_inert(*el))
            .find_map(|el| el.value().attr("href").and_then(|href| ctx.absolute(href)))
    }))
}

/// Whether any live element matches one of `selectors`.
pub fn has_live_match(document: &Html, selectors: &[&str]) -> Result<bool, HarvestError> {
    let compiled = compile_group(selectors)?;
    Ok(compiled
        .iter()
        .any(|selector| document.select(selector).any(|el| !is_inert(el))))
}

struct CompiledListing {
    cards: Vec<Selector>,
    title: CompiledText,
    company: CompiledText,
    location: CompiledText,
    description: CompiledText,
    posted: CompiledText,
    metadata: Vec<Selector>,
    metadata_cut: Option<char>,
    link: Vec<CompiledAttr>,
    logo: Vec<CompiledAttr>,
    source_id: Vec<CompiledAttr>,
}

impl CompiledListing {
    fn compile(table: &ListingSelectors) -> Result<Self, HarvestError> {
        Ok(Self {
            cards: compile_group(table.cards)?,
            title: CompiledText::compile(&table.title)?,
            company: CompiledText::compile(&table.company)?,
            location: CompiledText::compile(&table.location)?,
            description: CompiledText::compile(&table.description)?,
            posted: CompiledText::compile(&table.posted)?,
            metadata: compile_group(table.metadata)?,
            metadata_cut: table.metadata_cut,
            link: compile_attrs(table.link)?,
            logo: compile_attrs(table.logo)?,
            source_id: compile_attrs(table.source_id)?,
        })
    }

    fn find_cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.cards {
            let cards: Vec<_> = document.select(selector).collect();
            if !cards.is_empty() {
                return cards;
            }
        }
        Vec::new()
    }

    fn metadata_fragments(&self, card: ElementRef<'_>) -> Vec<String> {
        self.metadata
            .iter()
            .flat_map(|selector| card.select(selector))
            .filter_map(|el| fragment_text(el, self.metadata_cut))
            .collect()
    }

    fn record(&self, card: ElementRef<'_>, ctx: &ExtractContext) -> Result<JobRecord, HarvestError> {
        let title = self
            .title
            .resolve(card)
            .ok_or_else(|| HarvestError::ExtractionMiss("no title".to_string()))?;
        let company = self
            .company
            .resolve(card)
            .ok_or_else(|| HarvestError::ExtractionMiss(format!("no company for '{title}'")))?;

        let fragments = self.metadata_fragments(card);
        let posted_text = self.posted.resolve(card);
        let (posted_at, posted_at_defaulted) =
            dates::resolve_posted_at(posted_text.as_deref(), ctx.now);

        let source_url = resolve_attr(card, &self.link)
            .or_else(|| {
                (card.value().name() == "a")
                    .then(|| card.value().attr("href"))
                    .flatten()
                    .map(str::to_string)
            })
            .and_then(|href| ctx.absolute(&href))
            .unwrap_or_default();

        let source_id = resolve_attr(card, &self.source_id)
            .map(|id| id.rsplit(':').next().unwrap_or_default().to_string())
            .or_else(|| {
                DIGIT_RUN
                    .find_iter(&source_url)
                    .max_by_key(|m| m.end() - m.start())
                    .map(|m| m.as_str().to_string())
            })
            .unwrap_or_default();

        let company_logo_url = resolve_attr(card, &self.logo)
            .filter(|src| !src.starts_with("data:"))
            .and_then(|src| ctx.absolute(&src));

        let record = JobRecord {
            location: self.location.resolve(card).unwrap_or_default(),
            description: self.description.resolve(card).unwrap_or_default(),
            salary: classify::find_salary(&fragments).unwrap_or_default(),
            job_type: classify::find_job_type(&fragments).unwrap_or_default(),
            posted_at,
            source_platform: ctx.platform,
            source_id,
            source_url,
            company_logo_url,
            status: JobStatus::Unapplied,
            posted_at_defaulted,
            title,
            company,
        };

        if !record.is_complete() {
            return Err(HarvestError::ExtractionMiss(format!(
                "'{}' at {} has no location or link",
                record.title, record.company
            )));
        }
        Ok(record)
    }
}

/// Extract every acceptable record from a listing page.
pub fn extract_listings(
    document: &Html,
    table: &ListingSelectors,
    ctx: &ExtractContext,
) -> Result<ExtractedListings, HarvestError> {
    let compiled = CompiledListing::compile(table)?;
    let cards = compiled.find_cards(document);
    if cards.is_empty() {
        tracing::debug!("No {} listing cards matched at {}", ctx.platform, ctx.page_url);
    }

    let mut extracted = ExtractedListings::default();
    for (index, card) in cards.into_iter().enumerate() {
        match compiled.record(card, ctx) {
            Ok(record) => extracted.records.push(record),
            Err(e) => {
                extracted.misses += 1;
                tracing::debug!("Dropping {} entry {index}: {e}", ctx.platform);
            }
        }
    }
    Ok(extracted)
}

/// Reduced extraction over a detail page, limited to the `wanted` fields.
pub fn extract_detail(
    document: &Html,
    table: &DetailSelectors,
    wanted: MissingFields,
    ctx: &ExtractContext,
) -> Result<JobDetail, HarvestError> {
    let root = document.root_element();
    let texts = |group: &[&str], first_only: bool| -> Result<Vec<String>, HarvestError> {
        let compiled = compile_group(group)?;
        let mut out = Vec::new();
        for selector in &compiled {
            for el in root.select(selector) {
                if let Some(text) = element_text(el, false) {
                    out.push(text);
                    if first_only {
                        return Ok(out);
                    }
                }
            }
        }
        Ok(out)
    };

    let mut detail = JobDetail::default();
    if wanted.salary {
        detail.salary = classify::find_salary(&texts(table.salary, false)?);
    }
    if wanted.job_type {
        detail.job_type = classify::find_job_type(&texts(table.job_type, false)?);
    }
    if wanted.description {
        detail.description = texts(table.description, true)?.into_iter().next();
    }
    if wanted.posted_at {
        detail.posted_at = texts(table.posted, false)?
            .iter()
            .find_map(|text| dates::parse_relative(text, ctx.now));
    }
    Ok(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD_TABLE: ListingSelectors = ListingSelectors {
        cards: &["li.missing", "div.card"],
        title: TextField::first_line(&["h3.gone", "h3.title"]),
        company: TextField::new(&["span.company"]),
        location: TextField::new(&["span.where"]),
        description: TextField::new(&["p.teaser"]),
        posted: TextField::new(&["time"]),
        metadata: &["ul.meta li"],
        metadata_cut: Some('+'),
        link: &[AttrSource::on("a.title-link", "href")],
        logo: &[AttrSource::on("img.logo", "src")],
        source_id: &[AttrSource::own("data-id")],
    };

    fn ctx() -> ExtractContext {
        ExtractContext::new(Platform::Indeed, "https://au.indeed.com/jobs?q=rust", Utc::now()).unwrap()
    }

    #[test]
    fn clean_text_collapses_and_strips_ellipsis() {
        assert_eq!(clean_text("  Senior \n\t Rust   Engineer  "), "Senior Rust Engineer");
        assert_eq!(clean_text("Build services in Rust and …"), "Build services in Rust and");
        assert_eq!(clean_text("Great team... "), "Great team");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn extracts_fields_with_fallbacks() {
        let html = Html::parse_document(
            r#"<div class="card" data-id="77">
                 <h3 class="title">Rust Engineer
                    with verification</h3>
                 <a class="title-link" href="/viewjob?jk=abc">view</a>
                 <span class="company"> Ferris   Labs </span>
                 <span class="where">Sydney NSW</span>
                 <p class="teaser">Own the   ingestion pipeline…</p>
                 <time>3 days ago</time>
                 <ul class="meta"><li>Full time</li><li>$150,000 a year +1</li></ul>
                 <img class="logo" src="/logos/ferris.png">
               </div>"#,
        );
        let out = extract_listings(&html, &CARD_TABLE, &ctx()).unwrap();
        assert_eq!(out.misses, 0);
        let job = &out.records[0];
        assert_eq!(job.title, "Rust Engineer");
        assert_eq!(job.company, "Ferris Labs");
        assert_eq!(job.location, "Sydney NSW");
        assert_eq!(job.description, "Own the ingestion pipeline");
        assert_eq!(job.salary, "$150,000 a year");
        assert_eq!(job.job_type, "Full-time");
        assert_eq!(job.source_id, "77");
        assert_eq!(job.source_url, "https://au.indeed.com/viewjob?jk=abc");
        assert_eq!(
            job.company_logo_url.as_deref(),
            Some("https://au.indeed.com/logos/ferris.png")
        );
        assert!(!job.posted_at_defaulted);
    }

    #[test]
    fn entries_without_required_fields_are_dropped() {
        let html = Html::parse_document(
            r#"<div class="card"><h3 class="title">No company</h3>
                 <a class="title-link" href="/a">x</a><span class="where">Perth</span></div>
               <div class="card"><h3 class="title">No location</h3><span class="company">Acme</span>
                 <a class="title-link" href="/b">x</a></div>
               <div class="card"><h3 class="title">Kept</h3><span class="company">Acme</span>
                 <a class="title-link" href="/c">x</a><span class="where">Perth</span></div>"#,
        );
        let out = extract_listings(&html, &CARD_TABLE, &ctx()).unwrap();
        assert_eq!(out.misses, 2);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].title, "Kept");
        assert!(out.records[0].posted_at_defaulted);
    }

    #[test]
    fn inert_next_links_are_ignored() {
        let html = Html::parse_document(
            r#"<a class="next" aria-hidden="true" href="?page=9">next</a>
               <a class="next" href="?page=2">next</a>"#,
        );
        let next = follow_next_link(&html, &["a.next"], &ctx()).unwrap();
        assert_eq!(next.as_deref(), Some("https://au.indeed.com/jobs?page=2"));

        let none = Html::parse_document(r#"<a class="next" aria-disabled="true" href="?page=2">n</a>"#);
        assert_eq!(follow_next_link(&none, &["a.next"], &ctx()).unwrap(), None);
    }

    #[test]
    fn invalid_selectors_fail_only_when_nothing_compiles() {
        assert_eq!(compile_group(&["div[", "div.ok"]).unwrap().len(), 1);
        assert!(matches!(
            compile_group(&["div["]),
            Err(HarvestError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn detail_extraction_is_scoped_to_wanted_fields() {
        let html = Html::parse_document(
            r#"<div id="pay">$95,000 - $105,000 per year</div>
               <div id="kind">Permanent, Part time</div>
               <div id="body">Long   description</div>
               <span id="age">Posted 2d ago</span>"#,
        );
        let table = DetailSelectors {
            salary: &["#pay"],
            job_type: &["#kind"],
            description: &["#body"],
            posted: &["#age"],
        };
        let wanted = MissingFields {
            salary: true,
            job_type: true,
            description: false,
            posted_at: true,
        };
        let c = ctx();
        let detail = extract_detail(&html, &table, wanted, &c).unwrap();
        assert_eq!(detail.salary.as_deref(), Some("$95,000 - $105,000 per year"));
        assert_eq!(detail.job_type.as_deref(), Some("Part-time"));
        assert_eq!(detail.description, None);
        assert_eq!(detail.posted_at, Some(c.now - chrono::Duration::days(2)));
    }
}
