use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::extractor::error::ExtractorError;

static ISO_DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?$").unwrap()
});

#[inline]
pub fn capture_group_1<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, ExtractorError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ExtractorError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Parse the time part of an ISO-8601 duration, e.g. `PT1H2M3S`.
pub fn parse_iso8601_duration(value: &str) -> Option<Duration> {
    let caps = ISO_DURATION_REGEX.captures(value)?;
    if caps.get(1).is_none() && caps.get(2).is_none() && caps.get(3).is_none() {
        return None;
    }
    let number = |index: usize| -> Option<u64> {
        caps.get(index)
            .map(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(Some(0))
    };
    let hours = number(1)?;
    let minutes = number(2)?;
    let seconds = caps
        .get(3)
        .map(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(Some(0.0))?;

    let whole = hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)?;
    Duration::from_secs(whole).checked_add(Duration::try_from_secs_f64(seconds).ok()?)
}

/// Time elapsed between two instants, zero when `end` precedes `start`.
pub fn elapsed_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
    (end - start).to_std().unwrap_or_default()
}
