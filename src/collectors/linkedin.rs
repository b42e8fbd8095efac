use scraper::Html;

use crate::error::HarvestError;
use crate::extract::{self, AttrSource, DetailSelectors, ExtractContext, ListingSelectors, TextField};

/// Results per page; the `start` query parameter advances by this much.
pub const PAGE_SIZE: u32 = 25;

const TITLE_LINKS: &[&str] = &[
    r#"a[class*="job-card-list__title"]"#,
    r#"a[class*="job-card-container__link"]"#,
    r#"a[class*="job-card-job-posting-card"]"#,
    r#"a[class*="job-card-list__entity"]"#,
    r#"a[class*="job-card-container"]"#,
    r#"a[class*="job-posting-card"]"#,
    "h3.base-search-card__title",
];

pub(super) const LISTING: ListingSelectors = ListingSelectors {
    cards: &[
        "div[data-job-id]",
        "div.base-card",
        r#"div[data-view-name="job-card"]"#,
        r#"div[class*="job-card"]"#,
        "div.jobs-search-results__list-item",
        "div.job-card-container",
        "div.job-card-job-posting-card-wrapper",
    ],
    title: TextField::first_line(TITLE_LINKS),
    company: TextField::new(&[
        "h4.base-search-card__subtitle",
        r#"span[class*="company-name"]"#,
        r#"span[class*="entity-lockup__subtitle"]"#,
        r#"div[class*="job-card-container__company-name"]"#,
        r#"div[class*="job-card-list__company-name"]"#,
        r#"div[class*="entity-lockup__subtitle"]"#,
        r#"span[class*="subtitle"]"#,
    ]),
    location: TextField::new(&[
        "span.job-search-card__location",
        r#"span[class*="location"]"#,
        r#"li[class*="job-card-container__metadata-item"]"#,
        r#"span[class*="entity-lockup__caption"]"#,
        r#"div[class*="entity-lockup__caption"]"#,
        r#"div[class*="job-card-container__metadata"]"#,
    ]),
    description: TextField::new(&[
        r#"div[class*="job-card-container__description"]"#,
        r#"div[class*="job-card-list__description"]"#,
        r#"div[class*="snippet"]"#,
        r#"div[class*="description"]"#,
    ]),
    posted: TextField::new(&[
        "time",
        r#"span[class*="footer-item--time"]"#,
        r#"div[class*="footer-item--time"]"#,
        r#"span[class*="listed"]"#,
        r#"span[class*="time"]"#,
    ]),
    metadata: &[
        "span.job-search-card__salary-info",
        r#"li[class*="metadata"]"#,
        r#"span[class*="metadata"]"#,
        r#"div[class*="job-card-container__metadata"]"#,
        r#"div[class*="entity-lockup__metadata"]"#,
        r#"span[class*="job-insight"]"#,
    ],
    metadata_cut: None,
    link: &[
        AttrSource::on("a.base-card__full-link", "href"),
        AttrSource::on(r#"a[class*="job-card-list__title"]"#, "href"),
        AttrSource::on(r#"a[class*="job-card-container__link"]"#, "href"),
        AttrSource::on(r#"a[class*="job-card-job-posting-card"]"#, "href"),
        AttrSource::on(r#"a[class*="job-posting-card"]"#, "href"),
        AttrSource::on(r#"a[href*="/jobs/view/"]"#, "href"),
    ],
    logo: &[
        AttrSource::on(r#"img[class*="logo"]"#, "src"),
        AttrSource::on("img.artdeco-entity-image", "data-delayed-url"),
        AttrSource::on(r#"img[class*="entity-lockup__image"]"#, "src"),
        AttrSource::on("img.artdeco-entity-image", "src"),
    ],
    source_id: &[
        AttrSource::own("data-job-id"),
        AttrSource::own("data-entity-urn"),
        AttrSource::on("[data-job-id]", "data-job-id"),
        AttrSource::on("[data-entity-urn]", "data-entity-urn"),
    ],
};

pub(super) const DETAIL: DetailSelectors = DetailSelectors {
    salary: &[
        "div.salary.compensation__salary",
        "div.compensation__salary",
        r#"span[class*="job-insight"]"#,
        "li.description__job-criteria-item span",
    ],
    job_type: &[
        "span.job-type",
        "li.description__job-criteria-item span.description__job-criteria-text",
        r#"span[class*="job-insight"]"#,
        "span.workplace-type",
    ],
    description: &[
        "div.show-more-less-html__markup",
        "div.description__text",
        "div.jobs-description__content",
    ],
    posted: &["span.posted-time-ago__text", "time"],
};

const NEXT_CONTROLS: &[&str] = &[
    ".jobs-search-pagination__button--next",
    r#"button[aria-label="View next page"]"#,
    "button.infinite-scroller__show-more-button",
];

pub(super) fn is_login_wall(document: &Html) -> Result<bool, HarvestError> {
    extract::has_live_match(document, &["form.login-form"])
}

/// LinkedIn paginates by offset: when a live next control is rendered,
/// the next page is the current URL with `start` advanced by a page.
pub(super) fn next_page_url(
    document: &Html,
    ctx: &ExtractContext,
) -> Result<Option<String>, HarvestError> {
    if !extract::has_live_match(document, NEXT_CONTROLS)? {
        return Ok(None);
    }

    let mut url = ctx.page_url.clone();
    let start = url
        .query_pairs()
        .find(|(key, _)| key == "start")
        .and_then(|(_, value)| value.parse::<u32>().ok())
        .unwrap_or(0);
    let Some(next_start) = start.checked_add(PAGE_SIZE) else {
        return Ok(None);
    };
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "start")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("start", &next_start.to_string());
    Ok(Some(url.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::collectors::{PageSnapshot, Platform};

    const GUEST_PAGE: &str = r#"
        <ul class="jobs-search__results-list">
          <li>
            <div class="base-card base-search-card" data-entity-urn="urn:li:jobPosting:3901234567">
              <a class="base-card__full-link" href="https://au.linkedin.com/jobs/view/rust-engineer-at-ferris-3901234567?trk=guest"></a>
              <img class="artdeco-entity-image" data-delayed-url="https://media.licdn.com/ferris.png" src="data:image/gif;base64,R0lG">
              <div class="base-search-card__info">
                <h3 class="base-search-card__title">
                  Rust Engineer
                </h3>
                <h4 class="base-search-card__subtitle"><a href="/company/ferris">Ferris Labs</a></h4>
                <div class="base-search-card__metadata">
                  <span class="job-search-card__location">Sydney, New South Wales, Australia</span>
                  <span class="job-search-card__salary-info">A$150,000 - A$170,000</span>
                  <time class="job-search-card__listdate" datetime="2025-03-18">2 days ago</time>
                </div>
              </div>
            </div>
          </li>
          <li>
            <div class="base-card" data-entity-urn="urn:li:jobPosting:3907654321">
              <a class="base-card__full-link" href="/jobs/view/3907654321"></a>
              <h3 class="base-search-card__title">Platform Engineer</h3>
              <h4 class="base-search-card__subtitle">Crab Co</h4>
              <span class="job-search-card__location">Remote</span>
            </div>
          </li>
        </ul>
        <button class="infinite-scroller__show-more-button" aria-label="See more jobs">See more jobs</button>
    "#;

    fn snapshot(url: &str, html: &str) -> PageSnapshot {
        PageSnapshot {
            url: url.to_string(),
            html: html.to_string(),
        }
    }

    #[test]
    fn reads_guest_search_cards() {
        let page = Platform::LinkedIn
            .extract_listing_page(
                &snapshot(
                    "https://www.linkedin.com/jobs/search?keywords=rust&location=Sydney",
                    GUEST_PAGE,
                ),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(page.records.len(), 2);
        let first = &page.records[0];
        assert_eq!(first.title, "Rust Engineer");
        assert_eq!(first.company, "Ferris Labs");
        assert_eq!(first.location, "Sydney, New South Wales, Australia");
        assert_eq!(first.salary, "A$150,000 - A$170,000");
        assert_eq!(first.source_id, "3901234567");
        assert_eq!(
            first.company_logo_url.as_deref(),
            Some("https://media.licdn.com/ferris.png")
        );
        assert!(!first.posted_at_defaulted);

        let second = &page.records[1];
        assert_eq!(second.source_url, "https://www.linkedin.com/jobs/view/3907654321");
        assert!(second.posted_at_defaulted);
    }

    #[test]
    fn next_page_advances_start_offset() {
        let page = Platform::LinkedIn
            .extract_listing_page(
                &snapshot(
                    "https://www.linkedin.com/jobs/search?keywords=rust&start=25&location=Sydney",
                    GUEST_PAGE,
                ),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(
            page.next_page_url.as_deref(),
            Some("https://www.linkedin.com/jobs/search?keywords=rust&location=Sydney&start=50")
        );
    }

    #[test]
    fn offset_overflow_ends_pagination() {
        let page = Platform::LinkedIn
            .extract_listing_page(
                &snapshot(
                    "https://www.linkedin.com/jobs/search?keywords=rust&start=4294967290",
                    GUEST_PAGE,
                ),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.next_page_url, None);
    }

    #[test]
    fn no_next_control_ends_pagination() {
        let html = GUEST_PAGE.replace(
            r#"<button class="infinite-scroller__show-more-button" aria-label="See more jobs">"#,
            r#"<button class="infinite-scroller__show-more-button" disabled>"#,
        );
        let page = Platform::LinkedIn
            .extract_listing_page(
                &snapshot("https://www.linkedin.com/jobs/search?keywords=rust", &html),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.next_page_url, None);
    }

    #[test]
    fn login_wall_yields_empty_page() {
        let html = r#"<form class="login-form"><input name="session_key"></form>"#;
        let page = Platform::LinkedIn
            .extract_listing_page(
                &snapshot("https://www.linkedin.com/jobs/search?keywords=rust", html),
                Utc::now(),
            )
            .unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.next_page_url, None);
    }
}
