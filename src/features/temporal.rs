//! Calendar fields derived from `TransactionStartTime`

use crate::error::{ScoringError, ScoringResult};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Date-time layouts accepted besides RFC 3339. `%.f` also matches a
/// missing fractional part.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Hour, day-of-month, month and year of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalFeatures {
    pub hour: u32,
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl TemporalFeatures {
    /// Parse a raw timestamp and decompose it.
    pub fn extract(raw: &str) -> ScoringResult<Self> {
        parse_timestamp(raw).map(Self::from_datetime)
    }

    pub fn from_datetime(ts: NaiveDateTime) -> Self {
        Self {
            hour: ts.hour(),
            day: ts.day(),
            month: ts.month(),
            year: ts.year(),
        }
    }
}

/// Parse a timestamp in any accepted layout.
///
/// Timestamps carrying an offset keep their local wall-clock time.
pub fn parse_timestamp(raw: &str) -> ScoringResult<NaiveDateTime> {
    let text = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.naive_local());
    }

    if let Some(ts) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Ok(ts);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ScoringError::Parse {
            value: raw.to_string(),
            reason: "not a recognized timestamp format".to_string(),
        })
}
