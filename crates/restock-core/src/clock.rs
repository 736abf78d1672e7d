//! Local wall-clock helpers.
//!
//! Day boundaries (history reset, "first round of the day") follow the
//! operator's local calendar, not UTC.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Date format used by every persisted `date` field.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// `YYYY-MM-DD` key for a calendar day.
pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Human-readable local timestamp, e.g. `2026-10-19 14:03:22`.
pub fn display_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn now_rfc3339() -> String {
    Local::now().to_rfc3339()
}
