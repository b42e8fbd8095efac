use scraper::Html;

use crate::error::HarvestError;
use crate::extract::{self, AttrSource, DetailSelectors, ExtractContext, ListingSelectors, TextField};

const TITLES: &[&str] = &[
    r#"[data-testid="job-card-title"]"#,
    r#"a[data-automation="jobTitle"]"#,
    r#"a[class*="job-title"]"#,
    r#"a[id^="job-title"]"#,
];

pub(super) const LISTING: ListingSelectors = ListingSelectors {
    cards: &[
        r#"[data-testid="job-card"]"#,
        r#"article[data-card-type="JobCard"]"#,
        r#"[data-automation="job-card"]"#,
        r#"article[role="article"]"#,
    ],
    title: TextField::new(TITLES),
    company: TextField::new(&[
        r#"[data-automation="jobCompany"]"#,
        r#"a[data-type="company"]"#,
        r#"span[data-type="company"]"#,
    ]),
    location: TextField::new(&[
        r#"span[data-automation="jobCardLocation"]"#,
        r#"a[data-automation="jobLocation"]"#,
        r#"span[data-type="location"]"#,
    ]),
    description: TextField::new(&[
        r#"span[data-testid="job-card-teaser"]"#,
        r#"[data-automation="jobShortDescription"]"#,
    ]),
    posted: TextField::new(&[
        r#"span[data-automation="jobListingDate"]"#,
        r#"[data-automation="jobListingDate"]"#,
    ]),
    metadata: &[
        r#"span[data-automation="jobSalary"]"#,
        r#"[data-automation="jobWorkType"]"#,
        r#"[data-testid="work-type"]"#,
    ],
    metadata_cut: None,
    link: &[
        AttrSource::on(r#"a[data-testid="job-card-title"]"#, "href"),
        AttrSource::on(r#"a[data-automation="jobTitle"]"#, "href"),
        AttrSource::on(r#"a[class*="job-title"]"#, "href"),
        AttrSource::on(r#"a[href*="/job/"]"#, "href"),
    ],
    logo: &[AttrSource::on(r#"[data-automation="company-logo"] img"#, "src")],
    source_id: &[
        AttrSource::own("data-job-id"),
        AttrSource::on("[data-job-id]", "data-job-id"),
    ],
};

pub(super) const DETAIL: DetailSelectors = DetailSelectors {
    salary: &[
        r#"[data-automation="job-detail-salary"]"#,
        r#"[data-automation="job-salary"]"#,
    ],
    job_type: &[
        r#"[data-automation="job-detail-work-type"]"#,
        r#"[data-automation="job-work-type"]"#,
    ],
    description: &[
        r#"[data-automation="jobAdDetails"]"#,
        r#"[data-automation="jobDescription"]"#,
    ],
    posted: &[
        r#"[data-automation="job-detail-date"]"#,
        r#"span[class*="listed"]"#,
    ],
};

const NEXT_LINKS: &[&str] = &[
    r#"a[data-automation="page-next"]"#,
    r#"a[rel~="next"]"#,
    r#"a[aria-label="Next"]"#,
];

pub(super) fn next_page_url(
    document: &Html,
    ctx: &ExtractContext,
) -> Result<Option<String>, HarvestError> {
    extract::follow_next_link(document, NEXT_LINKS, ctx)
}

/// SEEK only serves Australia and New Zealand.
pub(super) fn regional_domain(location: &str) -> Option<&'static str> {
    if location.contains("Australia") {
        Some("www.seek.com.au")
    } else if location.contains("New Zealand") {
        Some("www.seek.co.nz")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::collectors::{PageSnapshot, Platform};
    use crate::models::job::MissingFields;

    fn card(id: u32, title: &str, company: &str, location: &str, extra: &str) -> String {
        format!(
            r#"<article data-card-type="JobCard" data-job-id="{id}">
                 <a data-testid="job-card-title" href="/job/{id}?type=standard">{title}</a>
                 <a data-automation="jobCompany">{company}</a>
                 <span data-automation="jobCardLocation">{location}</span>
                 {extra}
               </article>"#
        )
    }

    #[test]
    fn reads_cards_and_live_next_link() {
        let html = format!(
            r#"<div>{}{}</div>
               <ul><li><a data-automation="page-next" aria-hidden="false" href="/rust-jobs/in-sydney?page=2">Next</a></li></ul>"#,
            card(
                81000001,
                "Rust Developer",
                "Acme",
                "Sydney NSW",
                r#"<span data-automation="jobSalary">$140k - $160k p.a. + super</span>
                   <span data-automation="jobListingDate">3d ago</span>"#
            ),
            card(81000002, "Systems Engineer", "Crab Co", "Melbourne VIC", ""),
        );
        let page = Platform::Seek
            .extract_listing_page(
                &PageSnapshot {
                    url: "https://www.seek.com.au/rust-jobs/in-sydney".to_string(),
                    html,
                },
                Utc::now(),
            )
            .unwrap();

        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].source_id, "81000001");
        assert_eq!(page.records[0].salary, "$140k - $160k p.a. + super");
        assert_eq!(
            page.records[0].source_url,
            "https://www.seek.com.au/job/81000001?type=standard"
        );
        assert_eq!(
            page.next_page_url.as_deref(),
            Some("https://www.seek.com.au/rust-jobs/in-sydney?page=2")
        );
    }

    #[test]
    fn hidden_next_link_ends_pagination() {
        let html = format!(
            r#"{}<a data-automation="page-next" aria-hidden="true" href="?page=2">Next</a>"#,
            card(1, "Rust Developer", "Acme", "Sydney NSW", "")
        );
        let page = Platform::Seek
            .extract_listing_page(
                &PageSnapshot {
                    url: "https://www.seek.com.au/rust-jobs".to_string(),
                    html,
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(page.next_page_url, None);
    }

    #[test]
    fn detail_page_fills_salary_and_work_type() {
        let html = r#"<h1 data-automation="job-detail-title">Rust Developer</h1>
            <span data-automation="job-detail-salary">$150,000 - $170,000 per year</span>
            <span data-automation="job-detail-work-type">Full time</span>
            <div data-automation="jobAdDetails"><p>Build the   pipeline.</p></div>"#;
        let wanted = MissingFields {
            salary: true,
            job_type: true,
            description: true,
            posted_at: false,
        };
        let detail = Platform::Seek
            .extract_detail(
                &PageSnapshot {
                    url: "https://www.seek.com.au/job/81000001".to_string(),
                    html: html.to_string(),
                },
                wanted,
                Utc::now(),
            )
            .unwrap();
        assert_eq!(detail.salary.as_deref(), Some("$150,000 - $170,000 per year"));
        assert_eq!(detail.job_type.as_deref(), Some("Full-time"));
        assert_eq!(detail.description.as_deref(), Some("Build the pipeline."));
    }
}
