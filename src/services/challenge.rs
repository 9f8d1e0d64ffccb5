// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge orchestration: starting the challenge and logging days.
//!
//! The state transitions are pure functions ([`apply_start`],
//! [`prepare_log_write`], [`refresh_profile`]) that every store runs inside
//! its per-user serialization unit. [`ChallengeService`] adds the gates that
//! depend only on the request and the clock.

use std::sync::Arc;

use crate::db::{ChallengeStore, TotalRecompute};
use crate::error::{AppError, Result};
use crate::models::leaderboard::LEADERBOARD_SIZE;
use crate::models::{DailyLog, ExternalIdentity, LeaderboardEntry, User};
use crate::services::calendar::{ChallengeCalendar, ChallengeStatus};
use crate::services::scoring::{effective_goal_count, plan_log_write, LogWrite, LogWritePlan};
use crate::time_utils::{format_reference_rfc3339, parse_date};

/// Minimum number of goals to start the challenge.
pub const MIN_GOALS: usize = 5;

/// Maximum length of a single goal, in characters.
pub const MAX_GOAL_LENGTH: usize = 200;

/// Trim goals and check count and length.
pub fn normalize_goals(goals: Vec<String>) -> Result<Vec<String>> {
    let goals: Vec<String> = goals.into_iter().map(|g| g.trim().to_string()).collect();

    if goals.len() < MIN_GOALS {
        return Err(AppError::BadRequest(format!(
            "Please provide at least {} goals.",
            MIN_GOALS
        )));
    }
    if goals.iter().any(String::is_empty) {
        return Err(AppError::BadRequest("Goals must not be empty.".to_string()));
    }
    if goals.iter().any(|g| g.chars().count() > MAX_GOAL_LENGTH) {
        return Err(AppError::BadRequest(format!(
            "Goals must be at most {} characters.",
            MAX_GOAL_LENGTH
        )));
    }

    Ok(goals)
}

/// One-time transition to the started state.
///
/// Fails without changes if the user already started.
pub fn apply_start(user: &User, goals: Vec<String>, started_at: &str) -> Result<User> {
    if user.challenge_started {
        return Err(AppError::ChallengeAlreadyStarted);
    }

    let goals = normalize_goals(goals)?;

    let mut user = user.clone();
    user.goals = goals;
    user.challenge_started = true;
    user.challenge_start_date = Some(started_at.to_string());
    user.total_score = 0.0;
    Ok(user)
}

/// Map a login to an account: create it, or refresh the cached profile.
///
/// Challenge state (goals, score, start date) is never touched here.
pub fn refresh_profile(existing: Option<User>, identity: &ExternalIdentity, now: &str) -> User {
    let avatar_url = identity.avatar_url();

    match existing {
        Some(mut user) => {
            user.display_name = identity.display_name.clone();
            user.avatar_url = avatar_url;
            user.last_login = now.to_string();
            user
        }
        None => User::new(&identity.external_id, &identity.display_name, &avatar_url, now),
    }
}

/// Check a write against the account, then plan it.
///
/// Only started accounts may log: starting resets the total, so a log
/// written before it would no longer be counted.
pub fn prepare_log_write(
    user: &User,
    existing: Option<&DailyLog>,
    write: &LogWrite,
    now: &str,
) -> Result<LogWritePlan> {
    if !user.challenge_started {
        return Err(AppError::ChallengeNotStarted);
    }

    let total_goals = effective_goal_count(&user.goals);
    if write.completed_tasks.len() > total_goals {
        return Err(AppError::BadRequest(format!(
            "completedTasks has {} entries but there are only {} goals.",
            write.completed_tasks.len(),
            total_goals
        )));
    }

    Ok(plan_log_write(user, existing, write, now))
}

/// Result of a successful log write.
#[derive(Debug, Clone)]
pub struct LogOutcome {
    pub log: DailyLog,
    pub total_score: f64,
}

/// Entry point for every challenge operation.
#[derive(Clone)]
pub struct ChallengeService {
    calendar: ChallengeCalendar,
    store: Arc<dyn ChallengeStore>,
}

impl ChallengeService {
    pub fn new(calendar: ChallengeCalendar, store: Arc<dyn ChallengeStore>) -> Self {
        Self { calendar, store }
    }

    pub fn calendar(&self) -> &ChallengeCalendar {
        &self.calendar
    }

    pub fn status(&self) -> ChallengeStatus {
        self.calendar.status()
    }

    /// Current instant formatted for storage.
    fn now_string(&self) -> String {
        format_reference_rfc3339(self.calendar.clock().now())
    }

    /// Create or refresh the account for a login.
    pub async fn sign_in(&self, identity: &ExternalIdentity) -> Result<User> {
        let user = self.store.upsert_profile(identity, &self.now_string()).await?;
        tracing::info!(
            user_id = %user.external_id,
            display_name = %user.display_name,
            "User signed in"
        );
        Ok(user)
    }

    /// Look up an account that may no longer exist.
    pub async fn find_user(&self, external_id: &str) -> Result<Option<User>> {
        self.store.get_user(external_id).await
    }

    pub async fn get_user(&self, external_id: &str) -> Result<User> {
        self.find_user(external_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", external_id)))
    }

    /// Start the challenge with the given goals.
    pub async fn start_challenge(&self, external_id: &str, goals: Vec<String>) -> Result<User> {
        let goals = normalize_goals(goals)?;
        let goal_count = goals.len();

        let user = self
            .store
            .start_challenge(external_id, goals, &self.now_string())
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::ChallengeAlreadyStarted) {
                    tracing::warn!(user_id = %external_id, "Challenge start rejected: already started");
                }
            })?;

        tracing::info!(user_id = %external_id, goal_count, "Challenge started");
        Ok(user)
    }

    /// Log (or re-log) one day's completion.
    pub async fn log_day(&self, external_id: &str, write: LogWrite) -> Result<LogOutcome> {
        if parse_date(&write.date).is_none() {
            return Err(AppError::BadRequest(
                "date must be a valid YYYY-MM-DD calendar date.".to_string(),
            ));
        }

        if !self.calendar.is_log_date_allowed(&write.date) {
            tracing::warn!(
                user_id = %external_id,
                date = %write.date,
                today = %self.calendar.today(),
                "Log rejected: date outside logging window"
            );
            return Err(AppError::DateLocked(
                "This date is locked. You can only log for Today or Yesterday (IST).".to_string(),
            ));
        }

        let plan = self
            .store
            .commit_daily_log(external_id, &write, &self.now_string())
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::ChallengeNotStarted) {
                    tracing::warn!(user_id = %external_id, "Log rejected: challenge not started");
                }
            })?;

        tracing::info!(
            user_id = %external_id,
            date = %plan.log.date,
            day_number = plan.log.day_number,
            daily_score = plan.log.daily_score,
            delta = plan.delta.delta,
            replaced = plan.delta.replaces_existing,
            total_score = plan.user.total_score,
            "Daily log recorded"
        );

        Ok(LogOutcome {
            log: plan.log,
            total_score: plan.user.total_score,
        })
    }

    pub async fn logs(&self, external_id: &str) -> Result<Vec<DailyLog>> {
        self.store.get_logs_for_user(external_id).await
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        self.store.leaderboard(LEADERBOARD_SIZE).await
    }

    /// Drift recovery: rebuild the total from stored logs.
    pub async fn reconcile_total(&self, external_id: &str) -> Result<TotalRecompute> {
        let result = self.store.recompute_total(external_id).await?;

        if result.drift != 0.0 {
            tracing::warn!(
                user_id = %external_id,
                previous_total = result.previous_total,
                total_score = result.total_score,
                drift = result.drift,
                "Score drift corrected"
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::services::clock::Clock;
    use crate::time_utils::reference_local;
    use chrono::Utc;

    fn goals(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("goal {i}")).collect()
    }

    fn identity(id: &str) -> ExternalIdentity {
        ExternalIdentity {
            external_id: id.to_string(),
            display_name: format!("user-{id}"),
            avatar_hint: Some("hash".to_string()),
        }
    }

    fn write(date: &str, done: usize, total: usize) -> LogWrite {
        LogWrite {
            date: date.to_string(),
            day_number: 1,
            completed_tasks: (0..total).map(|i| i < done).collect(),
            note: None,
        }
    }

    /// Service over a memory store with the clock at `date` `hour`:00 IST.
    fn service_at(date: &str, hour: u32) -> (ChallengeService, Arc<Clock>) {
        let at = reference_local(parse_date(date).unwrap(), hour).with_timezone(&Utc);
        let clock = Arc::new(Clock::fixed(at));
        let calendar = ChallengeCalendar::new(parse_date("2026-01-19").unwrap(), clock.clone());
        (
            ChallengeService::new(calendar, Arc::new(MemoryDb::new())),
            clock,
        )
    }

    #[test]
    fn test_normalize_goals() {
        assert!(normalize_goals(goals(4)).is_err());
        assert_eq!(normalize_goals(goals(5)).unwrap().len(), 5);

        let mut padded = goals(5);
        padded[0] = "  read  ".to_string();
        assert_eq!(normalize_goals(padded).unwrap()[0], "read");

        let mut blank = goals(5);
        blank[2] = "   ".to_string();
        assert!(matches!(normalize_goals(blank), Err(AppError::BadRequest(_))));

        let mut long = goals(5);
        long[1] = "x".repeat(MAX_GOAL_LENGTH + 1);
        assert!(normalize_goals(long).is_err());
    }

    #[test]
    fn test_refresh_profile_keeps_challenge_state() {
        let mut user = User::new("7", "old", "old.png", "t0");
        user.challenge_started = true;
        user.goals = goals(5);
        user.total_score = 12.3;

        let refreshed = refresh_profile(Some(user.clone()), &identity("7"), "t1");

        assert_eq!(refreshed.display_name, "user-7");
        assert_eq!(
            refreshed.avatar_url,
            "https://cdn.discordapp.com/avatars/7/hash.png"
        );
        assert_eq!(refreshed.last_login, "t1");
        assert_eq!(refreshed.created_at, "t0");
        assert_eq!(refreshed.total_score, 12.3);
        assert_eq!(refreshed.goals, user.goals);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let (service, _) = service_at("2026-01-19", 12);
        service.sign_in(&identity("1")).await.unwrap();

        let first = service.start_challenge("1", goals(6)).await.unwrap();
        assert!(first.challenge_started);
        assert_eq!(
            first.challenge_start_date.as_deref(),
            Some("2026-01-19T12:00:00+05:30")
        );

        let err = service.start_challenge("1", goals(8)).await.unwrap_err();
        assert!(matches!(err, AppError::ChallengeAlreadyStarted));

        let user = service.get_user("1").await.unwrap();
        assert_eq!(user.goals, goals(6));
        assert_eq!(user.total_score, 0.0);
    }

    #[tokio::test]
    async fn test_start_unknown_user_is_not_found() {
        let (service, _) = service_at("2026-01-19", 12);
        let err = service.start_challenge("nobody", goals(5)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_relog_applies_delta_not_sum() {
        let (service, _) = service_at("2026-01-20", 12);
        service.sign_in(&identity("1")).await.unwrap();
        service.start_challenge("1", goals(10)).await.unwrap();

        let first = service.log_day("1", write("2026-01-20", 4, 10)).await.unwrap();
        assert_eq!(first.log.daily_score, 4.0);
        assert_eq!(first.total_score, 4.0);

        let second = service.log_day("1", write("2026-01-20", 7, 10)).await.unwrap();
        assert_eq!(second.log.daily_score, 7.0);
        assert_eq!(second.total_score, 7.0);

        assert_eq!(service.logs("1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_yesterday_locks_at_ten() {
        let (service, clock) = service_at("2026-02-05", 9);
        service.sign_in(&identity("1")).await.unwrap();
        service.start_challenge("1", goals(5)).await.unwrap();

        service.log_day("1", write("2026-02-04", 5, 5)).await.unwrap();

        clock.set_override(Some(
            reference_local(parse_date("2026-02-05").unwrap(), 10).with_timezone(&Utc),
        ));
        let err = service
            .log_day("1", write("2026-02-04", 1, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DateLocked(_)));

        let logs = service.logs("1").await.unwrap();
        assert_eq!(logs[0].daily_score, 10.0);
        assert_eq!(service.get_user("1").await.unwrap().total_score, 10.0);
    }

    #[tokio::test]
    async fn test_malformed_date_is_bad_request() {
        let (service, _) = service_at("2026-02-05", 9);
        let err = service
            .log_day("1", write("05/02/2026", 1, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_log_for_vanished_user_is_not_found() {
        let (service, _) = service_at("2026-02-05", 12);
        let err = service
            .log_day("ghost", write("2026-02-05", 1, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_leaderboard_only_lists_started_users() {
        let (service, _) = service_at("2026-01-19", 12);
        service.sign_in(&identity("1")).await.unwrap();
        service.sign_in(&identity("2")).await.unwrap();
        service.start_challenge("1", goals(5)).await.unwrap();

        let board = service.leaderboard().await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].display_name, "user-1");
    }

    #[tokio::test]
    async fn test_log_before_start_is_rejected() {
        let (service, _) = service_at("2026-01-20", 12);
        service.sign_in(&identity("1")).await.unwrap();

        let err = service
            .log_day("1", write("2026-01-20", 8, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ChallengeNotStarted));
        assert!(service.logs("1").await.unwrap().is_empty());

        // The total still matches the stored logs once the user starts
        service.start_challenge("1", goals(5)).await.unwrap();
        let user = service.get_user("1").await.unwrap();
        let sum: f64 = service
            .logs("1")
            .await
            .unwrap()
            .iter()
            .map(|log| log.daily_score)
            .sum();
        assert_eq!(user.total_score, sum);
        assert_eq!(user.total_score, 0.0);
    }

    #[tokio::test]
    async fn test_find_user_distinguishes_missing_accounts() {
        let (service, _) = service_at("2026-01-20", 12);
        service.sign_in(&identity("1")).await.unwrap();

        assert!(service.find_user("1").await.unwrap().is_some());
        assert!(service.find_user("nobody").await.unwrap().is_none());
        assert!(matches!(
            service.get_user("nobody").await,
            Err(AppError::NotFound(_))
        ));
    }
}
