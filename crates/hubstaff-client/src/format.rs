//! Date normalisation for query filters and request bodies
//!
//! Inputs may be RFC 3339 timestamps, naive date-times or bare dates. Naive
//! values are taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

fn parse(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::Validation(format!("invalid date '{input}'")))
}

/// `YYYY-MM-DD` of the instant in UTC, as used by `date[...]` filters and
/// body dates.
pub fn format_date(input: &str) -> Result<String> {
    Ok(parse(input)?.format("%Y-%m-%d").to_string())
}

/// RFC 3339 UTC timestamp with second precision, as used by `time_slot[...]`.
pub fn format_time_slot(input: &str) -> Result<String> {
    Ok(parse(input)?.to_rfc3339_opts(SecondsFormat::Secs, true))
}
