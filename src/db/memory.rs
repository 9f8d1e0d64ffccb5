// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for tests and local demos.
//!
//! Writers for the same user are serialized by a per-user async mutex;
//! writers for different users never contend.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::{ChallengeStore, TotalRecompute};
use crate::error::AppError;
use crate::models::daily_log::document_id;
use crate::models::leaderboard::rank;
use crate::models::{DailyLog, ExternalIdentity, LeaderboardEntry, User};
use crate::services::challenge::{apply_start, prepare_log_write, refresh_profile};
use crate::services::scoring::{self, LogWrite, LogWritePlan};

/// Per-user write locks.
type UserLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Memory-backed store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
    /// Keyed by `{user_id}_{date}`
    logs: Arc<DashMap<String, DailyLog>>,
    locks: UserLocks,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn user_lock(&self, external_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(external_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn user_or_not_found(&self, external_id: &str) -> Result<User, AppError> {
        self.users
            .get(external_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", external_id)))
    }

    fn logs_for(&self, external_id: &str) -> Vec<DailyLog> {
        let mut logs: Vec<DailyLog> = self
            .logs
            .iter()
            .filter(|entry| entry.value().user_id == external_id)
            .map(|entry| entry.value().clone())
            .collect();
        logs.sort_by(|a, b| a.date.cmp(&b.date));
        logs
    }

    /// Overwrite a user's stored total without touching logs.
    ///
    /// Exists to simulate drift in tests of the recovery path.
    pub fn force_total_score(&self, external_id: &str, total_score: f64) {
        if let Some(mut user) = self.users.get_mut(external_id) {
            user.total_score = total_score;
        }
    }
}

#[async_trait]
impl ChallengeStore for MemoryDb {
    async fn get_user(&self, external_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(external_id).map(|entry| entry.value().clone()))
    }

    async fn upsert_profile(
        &self,
        identity: &ExternalIdentity,
        now: &str,
    ) -> Result<User, AppError> {
        let lock = self.user_lock(&identity.external_id);
        let _guard = lock.lock().await;

        let existing = self
            .users
            .get(&identity.external_id)
            .map(|entry| entry.value().clone());
        let user = refresh_profile(existing, identity, now);
        self.users.insert(user.external_id.clone(), user.clone());

        Ok(user)
    }

    async fn start_challenge(
        &self,
        external_id: &str,
        goals: Vec<String>,
        started_at: &str,
    ) -> Result<User, AppError> {
        let lock = self.user_lock(external_id);
        let _guard = lock.lock().await;

        let user = self.user_or_not_found(external_id)?;
        let started = apply_start(&user, goals, started_at)?;
        self.users.insert(external_id.to_string(), started.clone());

        Ok(started)
    }

    async fn commit_daily_log(
        &self,
        external_id: &str,
        write: &LogWrite,
        now: &str,
    ) -> Result<LogWritePlan, AppError> {
        let lock = self.user_lock(external_id);
        let _guard = lock.lock().await;

        let user = self.user_or_not_found(external_id)?;
        let doc_id = document_id(external_id, &write.date);
        let existing = self.logs.get(&doc_id).map(|entry| entry.value().clone());

        let plan = prepare_log_write(&user, existing.as_ref(), write, now)?;

        self.logs.insert(doc_id, plan.log.clone());
        self.users.insert(external_id.to_string(), plan.user.clone());

        Ok(plan)
    }

    async fn get_logs_for_user(&self, external_id: &str) -> Result<Vec<DailyLog>, AppError> {
        Ok(self.logs_for(external_id))
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, AppError> {
        let users: Vec<User> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        Ok(rank(users, limit))
    }

    async fn recompute_total(&self, external_id: &str) -> Result<TotalRecompute, AppError> {
        let lock = self.user_lock(external_id);
        let _guard = lock.lock().await;

        let mut user = self.user_or_not_found(external_id)?;
        let previous_total = user.total_score;
        user.total_score = scoring::recompute_total(&self.logs_for(external_id));
        self.users.insert(external_id.to_string(), user.clone());

        Ok(TotalRecompute {
            previous_total,
            total_score: user.total_score,
            drift: scoring::round_tenths(previous_total - user.total_score),
        })
    }
}
