// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily score computation and incremental total reconciliation.
//!
//! Totals are maintained by applying per-write deltas rather than summing
//! every log on each write. Each log write must go through
//! [`plan_log_write`] exactly once, and logs are never deleted outside it.
//! [`recompute_total`] is the drift-recovery path.

use crate::models::{DailyLog, User};

/// Goal count assumed for accounts created before goals were stored.
pub const LEGACY_GOAL_COUNT: usize = 10;

/// Upper bound of a daily score.
pub const MAX_DAILY_SCORE: f64 = 10.0;

/// Round to one decimal place, half up on the tenths digit.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

/// Goal count used as the score denominator for `goals`.
///
/// Only accounts that predate goal tracking hit the fallback.
pub fn effective_goal_count(goals: &[String]) -> usize {
    if goals.is_empty() {
        LEGACY_GOAL_COUNT
    } else {
        goals.len()
    }
}

/// Normalized (0–10) score for one day's completion flags.
pub fn compute_daily_score(completed_tasks: &[bool], total_goals: usize) -> f64 {
    let total_goals = if total_goals == 0 {
        LEGACY_GOAL_COUNT
    } else {
        total_goals
    };
    let completed = completed_tasks.iter().filter(|done| **done).count();

    let raw = completed as f64 / total_goals as f64 * MAX_DAILY_SCORE;
    round_tenths(raw)
}

/// Change to apply to a running total when a day is (re)logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreDelta {
    pub delta: f64,
    /// Whether the write replaces an existing log for the same date.
    pub replaces_existing: bool,
}

/// Delta for writing `new_daily_score` over `existing` (if any).
pub fn reconcile(existing: Option<&DailyLog>, new_daily_score: f64) -> ScoreDelta {
    match existing {
        Some(log) => ScoreDelta {
            delta: new_daily_score - log.daily_score,
            replaces_existing: true,
        },
        None => ScoreDelta {
            delta: new_daily_score,
            replaces_existing: false,
        },
    }
}

/// Apply a delta to a total and re-round to suppress float drift.
pub fn apply_delta(total: f64, delta: f64) -> f64 {
    round_tenths(total + delta)
}

/// Full recomputation of a total from every stored log.
pub fn recompute_total<'a>(logs: impl IntoIterator<Item = &'a DailyLog>) -> f64 {
    let sum: f64 = logs.into_iter().map(|log| log.daily_score).sum();
    round_tenths(sum)
}

/// Validated log-write request, ready to be planned against stored state.
#[derive(Debug, Clone)]
pub struct LogWrite {
    pub date: String,
    pub day_number: u32,
    pub completed_tasks: Vec<bool>,
    pub note: Option<String>,
}

/// The documents to persist for one log write.
#[derive(Debug, Clone)]
pub struct LogWritePlan {
    pub log: DailyLog,
    pub user: User,
    pub delta: ScoreDelta,
}

/// Compute the new log and updated account for a write.
///
/// Pure: callers run it inside whatever per-user serialization their store
/// provides, against the account and existing log read in that same unit.
pub fn plan_log_write(
    user: &User,
    existing: Option<&DailyLog>,
    write: &LogWrite,
    now: &str,
) -> LogWritePlan {
    let daily_score = compute_daily_score(&write.completed_tasks, effective_goal_count(&user.goals));
    let delta = reconcile(existing, daily_score);

    let created_at = existing
        .map(|log| log.created_at.clone())
        .unwrap_or_else(|| now.to_string());

    let log = DailyLog {
        user_id: user.external_id.clone(),
        date: write.date.clone(),
        day_number: write.day_number,
        completed_tasks: write.completed_tasks.clone(),
        daily_score,
        note: write.note.clone(),
        created_at,
        updated_at: now.to_string(),
    };

    let mut user = user.clone();
    user.total_score = apply_delta(user.total_score, delta.delta);

    LogWritePlan { log, user, delta }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_goals(count: usize) -> User {
        let mut user = User::new("42", "tester", "https://example.com/a.png", "2026-01-19T00:00:00Z");
        user.goals = (0..count).map(|i| format!("goal {i}")).collect();
        user.challenge_started = true;
        user
    }

    fn tasks(done: usize, total: usize) -> Vec<bool> {
        (0..total).map(|i| i < done).collect()
    }

    fn write(date: &str, done: usize, total: usize) -> LogWrite {
        LogWrite {
            date: date.to_string(),
            day_number: 1,
            completed_tasks: tasks(done, total),
            note: None,
        }
    }

    #[test]
    fn test_round_tenths() {
        assert_eq!(round_tenths(3.333_333), 3.3);
        assert_eq!(round_tenths(6.666_666), 6.7);
        assert_eq!(round_tenths(0.25), 0.3);
        assert_eq!(round_tenths(0.0), 0.0);
        assert_eq!(round_tenths(10.0), 10.0);
    }

    #[test]
    fn test_daily_score_thirds() {
        assert_eq!(compute_daily_score(&tasks(3, 9), 9), 3.3);
        assert_eq!(compute_daily_score(&tasks(6, 9), 9), 6.7);
    }

    #[test]
    fn test_daily_score_bounds() {
        assert_eq!(compute_daily_score(&tasks(0, 5), 5), 0.0);
        assert_eq!(compute_daily_score(&tasks(5, 5), 5), 10.0);
        assert_eq!(compute_daily_score(&[], 7), 0.0);
    }

    #[test]
    fn test_legacy_goal_count_fallback() {
        assert_eq!(effective_goal_count(&[]), LEGACY_GOAL_COUNT);
        assert_eq!(compute_daily_score(&tasks(4, 10), 0), 4.0);

        let goals: Vec<String> = vec!["a".into(); 6];
        assert_eq!(effective_goal_count(&goals), 6);
    }

    #[test]
    fn test_reconcile_new_and_existing() {
        let user = user_with_goals(10);
        let first = plan_log_write(&user, None, &write("2026-01-19", 4, 10), "t1");
        assert_eq!(first.delta.delta, 4.0);
        assert!(!first.delta.replaces_existing);

        let delta = reconcile(Some(&first.log), 7.0);
        assert_eq!(delta.delta, 3.0);
        assert!(delta.replaces_existing);

        let lower = reconcile(Some(&first.log), 1.0);
        assert_eq!(lower.delta, -3.0);
    }

    #[test]
    fn test_overwrite_is_idempotent_on_total() {
        let user = user_with_goals(10);

        let first = plan_log_write(&user, None, &write("2026-01-19", 4, 10), "t1");
        assert_eq!(first.user.total_score, 4.0);

        let second = plan_log_write(
            &first.user,
            Some(&first.log),
            &write("2026-01-19", 7, 10),
            "t2",
        );
        assert_eq!(second.log.daily_score, 7.0);
        assert_eq!(second.user.total_score, 7.0);
        assert_eq!(second.log.created_at, "t1");
        assert_eq!(second.log.updated_at, "t2");
    }

    #[test]
    fn test_incremental_total_matches_recompute() {
        let mut user = user_with_goals(9);
        let mut logs: Vec<DailyLog> = Vec::new();

        for (day, done) in [3usize, 6, 9, 1, 2, 8, 5, 7, 4].iter().enumerate() {
            let date = format!("2026-01-{:02}", 19 + day);
            let plan = plan_log_write(&user, None, &write(&date, *done, 9), "t");
            user = plan.user;
            logs.push(plan.log);
        }

        // Re-log a few days with different values.
        for idx in [0usize, 4, 8] {
            let date = logs[idx].date.clone();
            let plan = plan_log_write(&user, Some(&logs[idx]), &write(&date, 9 - idx, 9), "t");
            user = plan.user;
            logs[idx] = plan.log;
        }

        assert_eq!(user.total_score, recompute_total(&logs));
    }

    #[test]
    fn test_plan_does_not_touch_other_fields() {
        let user = user_with_goals(5);
        let plan = plan_log_write(&user, None, &write("2026-01-19", 5, 5), "t");

        assert_eq!(plan.user.goals, user.goals);
        assert_eq!(plan.user.display_name, user.display_name);
        assert!(plan.user.challenge_started);
        assert_eq!(plan.log.user_id, "42");
    }
}
