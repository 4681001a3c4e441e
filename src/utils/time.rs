use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::{AppError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|source| AppError::DateParse {
        input: value.to_string(),
        source,
    })
}

/// Epoch seconds of UTC midnight on the given calendar date.
pub fn date_to_epoch(value: &str) -> Result<i64> {
    let date = parse_date(value)?;
    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        return Err(AppError::message(format!(
            "Unable to construct midnight timestamp for {value}"
        )));
    };
    Ok(Utc.from_utc_datetime(&midnight).timestamp())
}

/// Calendar date (UTC) containing the given epoch second.
pub fn epoch_to_date(epoch: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(epoch, 0).map(|dt| dt.date_naive())
}

pub fn epoch_to_datetime(epoch: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(epoch, 0)
}

pub fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Resolve an optional end date, falling back to the current wall-clock time.
pub fn end_epoch_or_now(end_date: Option<&str>) -> Result<i64> {
    match end_date {
        Some(value) => date_to_epoch(value),
        None => Ok(now_epoch()),
    }
}
