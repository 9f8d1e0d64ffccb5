// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! The challenge runs on a single reference timezone (IST, UTC+5:30).
//! Calendar dates cross the API boundary as `YYYY-MM-DD` strings in that
//! timezone and are only turned into structured dates for arithmetic.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Offset of the reference timezone from UTC, in seconds (+05:30).
pub const REFERENCE_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Calendar date format used at every API and storage boundary.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The reference timezone.
pub fn reference_tz() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_OFFSET_SECS).expect("reference offset is within ±24h")
}

/// Convert an instant to the reference timezone.
pub fn to_reference(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&reference_tz())
}

/// Midnight of `date` in the reference timezone.
pub fn reference_midnight(date: NaiveDate) -> DateTime<FixedOffset> {
    reference_local(date, 0)
}

/// `hour`:00 local time on `date` in the reference timezone.
///
/// Hours past 23 roll into the following day.
pub fn reference_local(date: NaiveDate, hour: u32) -> DateTime<FixedOffset> {
    let local = date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour));
    let utc = local - Duration::seconds(i64::from(REFERENCE_OFFSET_SECS));
    DateTime::from_naive_utc_and_offset(utc, reference_tz())
}

/// Format a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Format an instant in the reference timezone as RFC3339 (`+05:30` suffix).
pub fn format_reference_rfc3339(date: DateTime<FixedOffset>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, false)
}
