//! Salary and job-type classification over metadata fragments.

use std::sync::LazyLock;

use regex::Regex;

static CURRENCY_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[$€£¥]\s?\d|\b(?:AUD|USD|NZD|CAD|GBP|EUR)\s?\d").expect("currency pattern")
});

static PAY_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d[\d,.]*\s?k?\s*(?:(?:per\s+|/\s*|an?\s+)(?:hour|hr|day|week|month|year|yr|annum)\b|p\.\s?a\b\.?|annual(?:ly)?\b)",
    )
    .expect("pay period pattern")
});

static AGO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bago\b").expect("ago pattern"));

static JOB_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(full[\s-]?time|part[\s-]?time|contractor|contract|casual|internship|graduate|temporary)\b",
    )
    .expect("job type pattern")
});

/// Closed job-type vocabulary in canonical casing.
pub const JOB_TYPES: [&str; 8] = [
    "Full-time",
    "Part-time",
    "Contract",
    "Casual",
    "Internship",
    "Graduate",
    "Temporary",
    "Contractor",
];

/// A fragment reads as pay when it carries a currency amount, or a number
/// with a pay period ("45 per hour", "120k a year").
pub fn is_salary(fragment: &str) -> bool {
    if CURRENCY_AMOUNT.is_match(fragment) {
        return true;
    }
    if AGO.is_match(fragment) {
        return false;
    }
    PAY_PERIOD.is_match(fragment)
}

/// Canonical job type named in a fragment, if any.
pub fn job_type_of(fragment: &str) -> Option<&'static str> {
    let found = JOB_TYPE.find(fragment)?.as_str().to_lowercase();
    let squashed: String = found.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    JOB_TYPES
        .iter()
        .find(|t| t.to_lowercase().replace('-', "") == squashed)
        .copied()
}

pub fn find_salary<S: AsRef<str>>(fragments: &[S]) -> Option<String> {
    fragments
        .iter()
        .map(|f| f.as_ref())
        .find(|f| is_salary(f))
        .map(str::to_string)
}

pub fn find_job_type<S: AsRef<str>>(fragments: &[S]) -> Option<String> {
    fragments
        .iter()
        .find_map(|f| job_type_of(f.as_ref()))
        .map(str::to_string)
}
