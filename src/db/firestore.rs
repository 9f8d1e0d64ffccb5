// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile, goals, running total)
//! - Daily logs (one document per user per date)
//!
//! Score-affecting writes run inside `run_transaction`, so concurrent
//! requests for the same user are retried against fresh data instead of
//! losing updates.

use async_trait::async_trait;
use firestore::errors::{BackoffError, FirestoreError};
use firestore::FirestoreQueryDirection;
use futures_util::FutureExt;

use crate::db::{collections, ChallengeStore, TotalRecompute};
use crate::error::AppError;
use crate::models::daily_log::document_id;
use crate::models::{DailyLog, ExternalIdentity, LeaderboardEntry, User};
use crate::services::challenge::{apply_start, prepare_log_write, refresh_profile};
use crate::services::scoring::{self, LogWrite, LogWritePlan};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

/// Read a user inside a transaction-bound client.
async fn read_user(db: &firestore::FirestoreDb, external_id: &str) -> Result<Option<User>, FirestoreError> {
    db.fluent()
        .select()
        .by_id_in(collections::USERS)
        .obj()
        .one(external_id)
        .await
}

/// Query all logs for a user, date ascending.
async fn query_logs(
    db: &firestore::FirestoreDb,
    external_id: &str,
) -> Result<Vec<DailyLog>, FirestoreError> {
    db.fluent()
        .select()
        .from(collections::DAILY_LOGS)
        .filter(|q| q.for_all([q.field("user_id").eq(external_id)]))
        .order_by([("date", FirestoreQueryDirection::Ascending)])
        .obj()
        .query()
        .await
}

fn user_not_found(external_id: &str) -> AppError {
    AppError::NotFound(format!("User {} not found", external_id))
}

#[async_trait]
impl ChallengeStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, external_id: &str) -> Result<Option<User>, AppError> {
        Ok(read_user(self.get_client()?, external_id).await?)
    }

    async fn upsert_profile(
        &self,
        identity: &ExternalIdentity,
        now: &str,
    ) -> Result<User, AppError> {
        let identity = identity.clone();
        let now = now.to_string();

        let user = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let identity = identity.clone();
                let now = now.clone();
                async move {
                    let existing = read_user(&db, &identity.external_id).await?;
                    let user = refresh_profile(existing, &identity, &now);

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&user.external_id)
                        .object(&user)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(user)
                }
                .boxed()
            })
            .await?;

        tracing::debug!(user_id = %user.external_id, "User profile upserted");
        Ok(user)
    }

    async fn start_challenge(
        &self,
        external_id: &str,
        goals: Vec<String>,
        started_at: &str,
    ) -> Result<User, AppError> {
        let user_id = external_id.to_string();
        let started_at = started_at.to_string();

        // Domain rejections travel in the Ok value so the transaction is not
        // retried and the error keeps its type.
        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let user_id = user_id.clone();
                let goals = goals.clone();
                let started_at = started_at.clone();
                async move {
                    let outcome = match read_user(&db, &user_id).await? {
                        None => Err(user_not_found(&user_id)),
                        Some(user) => match apply_start(&user, goals, &started_at) {
                            Ok(started) => {
                                db.fluent()
                                    .update()
                                    .in_col(collections::USERS)
                                    .document_id(&user_id)
                                    .object(&started)
                                    .add_to_transaction(transaction)?;
                                Ok(started)
                            }
                            Err(e) => Err(e),
                        },
                    };
                    Ok::<_, BackoffError<FirestoreError>>(outcome)
                }
                .boxed()
            })
            .await?;

        outcome
    }

    // ─── Daily Log Operations ────────────────────────────────────

    async fn commit_daily_log(
        &self,
        external_id: &str,
        write: &LogWrite,
        now: &str,
    ) -> Result<LogWritePlan, AppError> {
        let user_id = external_id.to_string();
        let write = write.clone();
        let now = now.to_string();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let user_id = user_id.clone();
                let write = write.clone();
                let now = now.clone();
                async move {
                    // 1. Read the account and the existing log within the
                    //    transaction so both are checked for conflicts.
                    let Some(user) = read_user(&db, &user_id).await? else {
                        return Ok(Err(user_not_found(&user_id)));
                    };

                    let doc_id = document_id(&user_id, &write.date);
                    let existing: Option<DailyLog> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::DAILY_LOGS)
                        .obj()
                        .one(&doc_id)
                        .await?;

                    // 2. Compute new score and delta in memory.
                    let plan = match prepare_log_write(&user, existing.as_ref(), &write, &now) {
                        Ok(plan) => plan,
                        Err(e) => return Ok(Err(e)),
                    };

                    // 3. Log and account writes commit together.
                    db.fluent()
                        .update()
                        .in_col(collections::DAILY_LOGS)
                        .document_id(&doc_id)
                        .object(&plan.log)
                        .add_to_transaction(transaction)?;

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&user_id)
                        .object(&plan.user)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Ok(plan))
                }
                .boxed()
            })
            .await?;

        outcome
    }

    async fn get_logs_for_user(&self, external_id: &str) -> Result<Vec<DailyLog>, AppError> {
        Ok(query_logs(self.get_client()?, external_id).await?)
    }

    // ─── Leaderboard ─────────────────────────────────────────────

    async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("challenge_started").eq(true)]))
            .order_by([("total_score", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await?;

        Ok(users.iter().map(LeaderboardEntry::from).collect())
    }

    // ─── Drift Recovery ──────────────────────────────────────────

    async fn recompute_total(&self, external_id: &str) -> Result<TotalRecompute, AppError> {
        let user_id = external_id.to_string();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let user_id = user_id.clone();
                async move {
                    let Some(mut user) = read_user(&db, &user_id).await? else {
                        return Ok(Err(user_not_found(&user_id)));
                    };

                    let logs = query_logs(&db, &user_id).await?;
                    let previous_total = user.total_score;
                    user.total_score = scoring::recompute_total(&logs);

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&user_id)
                        .object(&user)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Ok(TotalRecompute {
                        previous_total,
                        total_score: user.total_score,
                        drift: scoring::round_tenths(previous_total - user.total_score),
                    }))
                }
                .boxed()
            })
            .await?;

        outcome
    }
}
