//! Local-time labels for rendered timestamps.

use chrono::{DateTime, Local, NaiveDate};

const DATE_FORMAT: &str = "%-d %b %Y";
const TIME_FORMAT: &str = "%H:%M";
const UNKNOWN_TIME: &str = "??:??";

fn local_datetime(timestamp_ms: i64) -> Option<DateTime<Local>> {
    DateTime::from_timestamp_millis(timestamp_ms).map(|utc| utc.with_timezone(&Local))
}

/// Local calendar day of `timestamp_ms`; out-of-range values count as today.
pub fn local_date(timestamp_ms: i64) -> NaiveDate {
    local_datetime(timestamp_ms)
        .map(|local| local.date_naive())
        .unwrap_or_else(|| Local::now().date_naive())
}

/// e.g. "14 Feb 2026"
pub fn date_label(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Local wall-clock time as `HH:MM`.
pub fn time_label(timestamp_ms: i64) -> String {
    local_datetime(timestamp_ms)
        .map(|local| local.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN_TIME.to_owned())
}
