use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collectors::Platform;

/// Application lifecycle label carried on every harvested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Unapplied,
    Applied,
    Interviewing,
    Offered,
    Rejected,
}

/// One job listing as harvested from a source platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub salary: String,
    pub job_type: String,
    pub posted_at: DateTime<Utc>,
    pub source_platform: Platform,
    pub source_id: String,
    pub source_url: String,
    pub company_logo_url: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    /// `posted_at` fell back to the extraction time.
    #[serde(skip)]
    pub posted_at_defaulted: bool,
}

/// Fields the detail enricher is allowed to fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissingFields {
    pub salary: bool,
    pub job_type: bool,
    pub description: bool,
    pub posted_at: bool,
}

impl MissingFields {
    pub fn any(&self) -> bool {
        self.salary || self.job_type || self.description || self.posted_at
    }
}

/// Partial record read from a detail page. `None` means the page had
/// nothing usable for that field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobDetail {
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Deduplication key: lowercase(title)|lowercase(company)|lowercase(location).
    pub fn canonical_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.title.to_lowercase(),
            self.company.to_lowercase(),
            self.location.to_lowercase()
        )
    }

    /// A record may only enter the result set with all four identifying
    /// fields populated.
    pub fn is_complete(&self) -> bool {
        [&self.title, &self.company, &self.location, &self.source_url]
            .iter()
            .all(|v| !v.trim().is_empty())
    }

    pub fn missing_fields(&self) -> MissingFields {
        MissingFields {
            salary: self.salary.is_empty(),
            job_type: self.job_type.is_empty(),
            description: self.description.is_empty(),
            posted_at: self.posted_at_defaulted,
        }
    }

    /// Fill empty fields from a detail page. Populated fields are never
    /// overwritten. Returns how many fields changed.
    pub fn merge_detail(&mut self, detail: JobDetail) -> usize {
        let mut filled = 0;

        if let Some(salary) = detail.salary.filter(|s| !s.is_empty())
            && self.salary.is_empty()
        {
            self.salary = salary;
            filled += 1;
        }
        if let Some(job_type) = detail.job_type.filter(|s| !s.is_empty())
            && self.job_type.is_empty()
        {
            self.job_type = job_type;
            filled += 1;
        }
        if let Some(description) = detail.description.filter(|s| !s.is_empty())
            && self.description.is_empty()
        {
            self.description = description;
            filled += 1;
        }
        if let Some(posted_at) = detail.posted_at
            && self.posted_at_defaulted
        {
            self.posted_at = posted_at;
            self.posted_at_defaulted = false;
            filled += 1;
        }

        filled
    }
}

#[cfg(test)]
pub(crate) fn sample(title: &str, company: &str, location: &str) -> JobRecord {
    JobRecord {
        title: title.to_string(),
        company: company.to_string(),
        location: location.to_string(),
        description: String::new(),
        salary: String::new(),
        job_type: String::new(),
        posted_at: Utc::now(),
        source_platform: Platform::Seek,
        source_id: String::new(),
        source_url: format!("https://www.seek.com.au/job/{}", title.len()),
        company_logo_url: None,
        status: JobStatus::Unapplied,
        posted_at_defaulted: false,
    }
}
