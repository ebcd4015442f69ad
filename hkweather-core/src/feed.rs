//! One module per HKO dataset. Each function performs a single request (two for the
//! cyclone list) and converts the payload into crate models.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::DataError;

pub mod astronomy;
pub mod cyclone;
pub mod forecast;
pub mod lunar;
pub mod regional;
pub mod report;
pub mod tips;
pub mod warnings;

pub(crate) const WEATHER_PHP: &str = "/weatherAPI/opendata/weather.php";
pub(crate) const OPENDATA_PHP: &str = "/weatherAPI/opendata/opendata.php";

/// `"10%"` -> `10.0`
pub fn parse_percentage(raw: &str) -> Result<f64, DataError> {
    let trimmed = raw.trim();
    trimmed
        .strip_suffix('%')
        .unwrap_or(trimmed)
        .trim()
        .parse()
        .map_err(|_| DataError::Percentage(raw.to_string()))
}

/// `yyyyMMdd`
pub(crate) fn parse_compact_date(raw: &str) -> Result<NaiveDate, DataError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y%m%d").map_err(|_| DataError::Timestamp {
        kind: "date",
        value: raw.to_string(),
    })
}

/// `yyyyMMddHH`
pub(crate) fn parse_compact_hour(raw: &str) -> Result<NaiveDateTime, DataError> {
    let raw = raw.trim();
    let invalid = || DataError::Timestamp {
        kind: "forecast hour",
        value: raw.to_string(),
    };

    if raw.len() != 10 || !raw.is_ascii() {
        return Err(invalid());
    }
    let date = parse_compact_date(&raw[..8]).map_err(|_| invalid())?;
    let hour: u32 = raw[8..].parse().map_err(|_| invalid())?;
    date.and_hms_opt(hour, 0, 0).ok_or_else(invalid)
}

/// `HH:mm`; blank means the event does not occur.
pub(crate) fn parse_clock_time(raw: &str) -> Result<Option<NaiveTime>, DataError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(Some)
        .map_err(|_| DataError::Timestamp {
            kind: "time",
            value: raw.to_string(),
        })
}

pub(crate) fn parse_update_time(raw: &str) -> Result<DateTime<FixedOffset>, DataError> {
    DateTime::parse_from_rfc3339(raw.trim()).map_err(|_| DataError::Timestamp {
        kind: "update time",
        value: raw.to_string(),
    })
}
