use scraper::Html;

use crate::error::HarvestError;
use crate::extract::{self, AttrSource, DetailSelectors, ExtractContext, ListingSelectors, TextField};

/// Registrable domains Indeed serves search results from.
pub(super) const DOMAINS: [&str; 11] = [
    "indeed.com",
    "indeed.co.uk",
    "indeed.ca",
    "indeed.com.au",
    "indeed.co.nz",
    "indeed.co.in",
    "indeed.ie",
    "indeed.de",
    "indeed.fr",
    "indeed.nl",
    "indeed.jobs",
];

pub(super) const LISTING: ListingSelectors = ListingSelectors {
    cards: &[
        "div.job_seen_beacon",
        r#"div[class*="job_seen_"]"#,
        r#"div[class*="cardOutline"]"#,
        r#"div[data-testid="job-card"]"#,
        "div.resultContent",
        "td.resultContent",
    ],
    title: TextField::new(&[
        "h2.jobTitle a",
        "h2 a[data-jk]",
        "h2.jobTitle span[title]",
        "a[data-jk] span[title]",
        r#"[class*="jobTitle"]"#,
        r#"a[id^="job_"]"#,
    ]),
    company: TextField::new(&[
        r#"span[data-testid="company-name"]"#,
        "span.companyName",
        r#"[data-testid="company-name"]"#,
        r#"span[class*="companyName"]"#,
        r#"div[class*="company"] span"#,
    ]),
    location: TextField::new(&[
        r#"div[data-testid="text-location"]"#,
        "div.companyLocation",
        r#"div[class*="location"]"#,
        r#"div[class*="workplace"]"#,
    ]),
    description: TextField::new(&[
        r#"div[data-testid="jobsnippet_footer"] ul li"#,
        ".job-snippet",
        ".underShelfFooter .heading6 ul li",
    ]),
    posted: TextField::new(&[
        "span.date",
        r#"span[data-testid="myJobsStateDate"]"#,
    ]),
    metadata: &[r#".metadataContainer li div[data-testid^="attribute_snippet"]"#],
    metadata_cut: Some('+'),
    link: &[
        AttrSource::on("h2.jobTitle a", "href"),
        AttrSource::on("a[data-jk]", "href"),
        AttrSource::on(r#"a[id^="job_"]"#, "href"),
    ],
    logo: &[AttrSource::on("img.companyAvatar", "src")],
    source_id: &[
        AttrSource::on("a[data-jk]", "data-jk"),
        AttrSource::own("data-jk"),
    ],
};

pub(super) const DETAIL: DetailSelectors = DetailSelectors {
    salary: &[
        r#"div[data-testid="attribute_snippet_compensation"]"#,
        "#salaryInfoAndJobType span",
        "#salaryGuide li",
    ],
    job_type: &[
        r#"div[data-testid="attribute_snippet_job_type"]"#,
        "#salaryInfoAndJobType span",
        r#"[data-testid="jobsearch-OtherJobDetailsContainer"] li"#,
    ],
    description: &["div#jobDescriptionText"],
    posted: &[r#"span[data-testid="myJobsStateDate"]"#, "span.date"],
};

const NEXT_LINKS: &[&str] = &[
    r#"a[data-testid="pagination-page-next"]"#,
    r#"a[aria-label="Next Page"]"#,
    r#"a[aria-label="Next"]"#,
];

pub(super) fn next_page_url(
    document: &Html,
    ctx: &ExtractContext,
) -> Result<Option<String>, HarvestError> {
    extract::follow_next_link(document, NEXT_LINKS, ctx)
}

/// Country-specific Indeed host; anything unrecognised goes to the
/// international site.
pub(super) fn regional_domain(location: &str) -> &'static str {
    [
        ("United Kingdom", "uk.indeed.com"),
        ("Canada", "ca.indeed.com"),
        ("United States", "www.indeed.com"),
        ("New Zealand", "nz.indeed.com"),
        ("Australia", "au.indeed.com"),
    ]
    .into_iter()
    .find(|(country, _)| location.contains(country))
    .map(|(_, domain)| domain)
    .unwrap_or("www.indeed.com")
}
