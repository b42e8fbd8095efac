//! Relative posting-age resolution ("3 days ago" → absolute timestamp).
//!
//! Policy: the first "<n> <unit> ago" phrase in the text wins. Months are
//! 30 days. A handful of words ("today", "just now", "yesterday") are
//! understood; everything else resolves to `now` and is flagged as
//! defaulted so the detail enricher may replace it later.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(\d+)\+?\s*|(an?|one)\s+)(months?|mos?|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|wks?|w)\s+ago\b",
    )
    .expect("relative date pattern")
});

static TODAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(just\s+now|just\s+posted|today|new)\b").expect("today pattern")
});

static YESTERDAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\byesterday\b").expect("yesterday pattern"));

fn unit_duration(unit: &str, n: i64) -> Option<Duration> {
    let unit = unit.to_lowercase();
    if unit.starts_with("mo") {
        Duration::try_days(n.checked_mul(30)?)
    } else if unit.starts_with('m') {
        Duration::try_minutes(n)
    } else if unit.starts_with('h') {
        Duration::try_hours(n)
    } else if unit.starts_with('d') {
        Duration::try_days(n)
    } else if unit.starts_with('w') {
        Duration::try_weeks(n)
    } else {
        None
    }
}

/// Parse a relative age. `None` when the text carries no recognizable age.
pub fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(caps) = RELATIVE.captures(text) {
        let n = match (caps.get(1), caps.get(2)) {
            (Some(digits), _) => digits.as_str().parse::<i64>().ok()?,
            (None, Some(_)) => 1,
            (None, None) => return None,
        };
        let duration = unit_duration(caps.get(3)?.as_str(), n)?;
        return now.checked_sub_signed(duration);
    }

    if YESTERDAY.is_match(text) {
        return Some(now - Duration::days(1));
    }
    if TODAY.is_match(text) {
        return Some(now);
    }
    None
}

/// Resolve the posting time of a listing. Returns the timestamp and whether
/// it was defaulted to `now`.
pub fn resolve_posted_at(text: Option<&str>, now: DateTime<Utc>) -> (DateTime<Utc>, bool) {
    match text.and_then(|t| parse_relative(t, now)) {
        Some(at) => (at, false),
        None => (now, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn days_and_weeks() {
        let now = at();
        assert_eq!(parse_relative("3 days ago", now), Some(now - Duration::days(3)));
        assert_eq!(parse_relative("2 weeks ago", now), Some(now - Duration::days(14)));
        assert_eq!(
            parse_relative("Posted 1 hour ago", now),
            Some(now - Duration::hours(1))
        );
    }

    #[test]
    fn months_are_thirty_days() {
        let now = at();
        assert_eq!(parse_relative("2 months ago", now), Some(now - Duration::days(60)));
        assert_eq!(parse_relative("1mo ago", now), Some(now - Duration::days(30)));
    }

    #[test]
    fn abbreviations_and_articles() {
        let now = at();
        assert_eq!(parse_relative("3d ago", now), Some(now - Duration::days(3)));
        assert_eq!(parse_relative("5m ago", now), Some(now - Duration::minutes(5)));
        assert_eq!(parse_relative("12h ago", now), Some(now - Duration::hours(12)));
        assert_eq!(parse_relative("an hour ago", now), Some(now - Duration::hours(1)));
        assert_eq!(parse_relative("a day ago", now), Some(now - Duration::days(1)));
        assert_eq!(
            parse_relative("Posted 30+ days ago", now),
            Some(now - Duration::days(30))
        );
    }

    #[test]
    fn first_phrase_wins() {
        let now = at();
        assert_eq!(
            parse_relative("Reposted 2 days ago · first seen 3 weeks ago", now),
            Some(now - Duration::days(2))
        );
    }

    #[test]
    fn keywords() {
        let now = at();
        assert_eq!(parse_relative("Just posted", now), Some(now));
        assert_eq!(parse_relative("Active today", now), Some(now));
        assert_eq!(parse_relative("yesterday", now), Some(now - Duration::days(1)));
    }

    #[test]
    fn unparseable_defaults_to_now() {
        let now = at();
        assert_eq!(parse_relative("Closing soon", now), None);
        assert_eq!(resolve_posted_at(Some("Closing soon"), now), (now, true));
        assert_eq!(resolve_posted_at(None, now), (now, true));
        assert_eq!(
            resolve_posted_at(Some("3 days ago"), now),
            (now - Duration::days(3), false)
        );
    }
}
