//! Flexible datetime parsing for command bodies and extracted slots.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{CoreError, CoreResult};

/// Formats tried in order for date+time values.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse a user-supplied datetime string.
///
/// Accepted forms (UTC assumed, no timezone suffix):
/// - `YYYY-MM-DD` (midnight)
/// - `YYYY-MM-DD HH:MM[:SS]`
/// - `YYYY-MM-DDTHH:MM[:SS]`
///
/// Anything else fails with [`CoreError::DateTimeParse`] naming the
/// offending string and the accepted formats.
pub fn parse_datetime(value: &str) -> CoreResult<NaiveDateTime> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        // Date-only form resolves to midnight; always representable.
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }

    Err(CoreError::DateTimeParse {
        value: value.to_string(),
    })
}
