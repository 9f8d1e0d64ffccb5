// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge calendar: phase, day number and log-date eligibility.
//!
//! All arithmetic happens on calendar dates in the reference timezone.
//! The day number is the whole-calendar-day difference between today and
//! the start date plus one, so intra-day time never skews it.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::services::clock::Clock;
use crate::time_utils::{format_date, parse_date, reference_midnight};

/// Length of the challenge in days.
pub const CHALLENGE_LENGTH_DAYS: i64 = 21;

/// Local hour at which yesterday's log locks.
pub const GRACE_WINDOW_END_HOUR: u32 = 10;

/// Challenge phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengePhase {
    PreStart,
    Active,
    Completed,
}

/// Snapshot of the challenge as seen at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeStatus {
    pub is_active: bool,
    pub status: ChallengePhase,
    pub day_number: i64,
    pub current_date: String,
    pub start_date: String,
    pub is_grace_period_active: bool,
}

/// Calendar for one fixed challenge.
#[derive(Debug, Clone)]
pub struct ChallengeCalendar {
    start_date: NaiveDate,
    clock: Arc<Clock>,
}

impl ChallengeCalendar {
    pub fn new(start_date: NaiveDate, clock: Arc<Clock>) -> Self {
        Self { start_date, clock }
    }

    pub fn clock(&self) -> &Arc<Clock> {
        &self.clock
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// The challenge-start instant (midnight of day 1, reference timezone).
    pub fn start_instant(&self) -> DateTime<FixedOffset> {
        reference_midnight(self.start_date)
    }

    /// Today's date (`YYYY-MM-DD`) in the reference timezone.
    pub fn today(&self) -> String {
        format_date(self.clock.now().date_naive())
    }

    pub fn status(&self) -> ChallengeStatus {
        self.status_at(self.clock.now())
    }

    pub fn is_log_date_allowed(&self, date: &str) -> bool {
        is_log_date_allowed_at(self.clock.now(), date)
    }

    /// Challenge status at an arbitrary instant.
    pub fn status_at(&self, now: DateTime<FixedOffset>) -> ChallengeStatus {
        let today = now.date_naive();
        let current_date = format_date(today);
        let start_date = format_date(self.start_date);

        if now < self.start_instant() {
            return ChallengeStatus {
                is_active: false,
                status: ChallengePhase::PreStart,
                day_number: 0,
                current_date,
                start_date,
                is_grace_period_active: false,
            };
        }

        let day_number = elapsed_days(self.start_date, today) + 1;

        if day_number > CHALLENGE_LENGTH_DAYS {
            return ChallengeStatus {
                is_active: false,
                status: ChallengePhase::Completed,
                day_number,
                current_date,
                start_date,
                is_grace_period_active: false,
            };
        }

        ChallengeStatus {
            is_active: true,
            status: ChallengePhase::Active,
            day_number,
            current_date,
            start_date,
            is_grace_period_active: now.hour() < GRACE_WINDOW_END_HOUR,
        }
    }
}

/// Whole calendar days from `start` to `today`.
fn elapsed_days(start: NaiveDate, today: NaiveDate) -> i64 {
    i64::from(today.num_days_from_ce() - start.num_days_from_ce())
}

/// Whether `date` may be logged at `now`.
///
/// Today is always open. Yesterday stays open until 10:00 local time.
/// Anything else, including malformed input and future dates, is closed.
pub fn is_log_date_allowed_at(now: DateTime<FixedOffset>, date: &str) -> bool {
    let Some(requested) = parse_date(date) else {
        return false;
    };
    let today = now.date_naive();

    if requested == today {
        return true;
    }

    today.pred_opt() == Some(requested) && now.hour() < GRACE_WINDOW_END_HOUR
}
