// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Every mutation of a user's score runs as one serializable unit per user:
//! Firestore transactions in production, a per-user lock in memory.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppError;
use crate::models::{DailyLog, ExternalIdentity, LeaderboardEntry, User};
use crate::services::scoring::{LogWrite, LogWritePlan};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Daily logs, keyed by `{user_id}_{date}`
    pub const DAILY_LOGS: &str = "daily_logs";
}

/// Result of a full recomputation of a user's total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalRecompute {
    pub previous_total: f64,
    pub total_score: f64,
    pub drift: f64,
}

/// Persistence for accounts and daily logs.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Get a user by external ID.
    async fn get_user(&self, external_id: &str) -> Result<Option<User>, AppError>;

    /// Create the account on first login, else refresh its profile fields.
    async fn upsert_profile(
        &self,
        identity: &ExternalIdentity,
        now: &str,
    ) -> Result<User, AppError>;

    /// Start the challenge for a user (one-time transition).
    async fn start_challenge(
        &self,
        external_id: &str,
        goals: Vec<String>,
        started_at: &str,
    ) -> Result<User, AppError>;

    /// Upsert a day's log and apply the score delta to the user's total.
    async fn commit_daily_log(
        &self,
        external_id: &str,
        write: &LogWrite,
        now: &str,
    ) -> Result<LogWritePlan, AppError>;

    /// All logs for a user, ordered by date ascending.
    async fn get_logs_for_user(&self, external_id: &str) -> Result<Vec<DailyLog>, AppError>;

    /// Started accounts by total score descending, at most `limit`.
    async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, AppError>;

    /// Recompute a user's total from every stored log.
    async fn recompute_total(&self, external_id: &str) -> Result<TotalRecompute, AppError>;
}
