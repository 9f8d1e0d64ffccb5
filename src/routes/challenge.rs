// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge routes for authenticated users.

use crate::db::TotalRecompute;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{DailyLog, User};
use crate::routes::extract::ValidatedJson;
use crate::services::calendar::ChallengeStatus;
use crate::services::scoring::LogWrite;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Challenge routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/challenge/start", post(start_challenge))
        .route("/api/challenge/log", post(log_day))
        .route("/api/challenge/logs", get(get_logs))
        .route("/api/challenge/status", get(get_status))
        .route("/api/challenge/reconcile", post(reconcile))
}

// ─── Response Types ──────────────────────────────────────────

/// User account as returned by the API.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: String,
    pub goals: Vec<String>,
    pub challenge_started: bool,
    pub challenge_start_date: Option<String>,
    pub total_score: f64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            external_id: user.external_id,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            goals: user.goals,
            challenge_started: user.challenge_started,
            challenge_start_date: user.challenge_start_date,
            total_score: user.total_score,
        }
    }
}

/// Daily log as returned by the API.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogResponse {
    pub date: String,
    pub day_number: u32,
    pub completed_tasks: Vec<bool>,
    pub daily_score: f64,
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DailyLog> for DailyLogResponse {
    fn from(log: DailyLog) -> Self {
        Self {
            date: log.date,
            day_number: log.day_number,
            completed_tasks: log.completed_tasks,
            daily_score: log.daily_score,
            note: log.note,
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state.challenge.get_user(&user.user_id).await?;
    Ok(Json(profile.into()))
}

// ─── Start Challenge ─────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct StartChallengeRequest {
    #[validate(
        required(message = "Please provide at least 5 goals."),
        length(min = 5, message = "Please provide at least 5 goals.")
    )]
    pub goals: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct StartChallengeResponse {
    pub success: bool,
    pub user: UserResponse,
}

/// Start the challenge and fix the user's goals.
async fn start_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<StartChallengeRequest>,
) -> Result<Json<StartChallengeResponse>> {
    let goals = body.goals.unwrap_or_default();
    tracing::debug!(user_id = %user.user_id, goal_count = goals.len(), "Starting challenge");

    let started = state.challenge.start_challenge(&user.user_id, goals).await?;

    Ok(Json(StartChallengeResponse {
        success: true,
        user: started.into(),
    }))
}

// ─── Daily Log ───────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogDayRequest {
    #[validate(required(message = "Missing required fields."))]
    pub date: Option<String>,
    #[validate(
        required(message = "Missing required fields."),
        range(min = 1, message = "dayNumber must be at least 1.")
    )]
    pub day_number: Option<u32>,
    #[validate(required(message = "Missing required fields."))]
    pub completed_tasks: Option<Vec<bool>>,
    #[validate(length(max = 500, message = "note must be at most 500 characters."))]
    pub note: Option<String>,
}

impl LogDayRequest {
    /// Convert a validated request into a log write.
    fn into_write(self) -> LogWrite {
        LogWrite {
            date: self.date.unwrap_or_default(),
            day_number: self.day_number.unwrap_or_default(),
            completed_tasks: self.completed_tasks.unwrap_or_default(),
            note: self.note.filter(|n| !n.is_empty()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDayResponse {
    pub success: bool,
    pub log: DailyLogResponse,
    pub total_score: f64,
}

/// Log (or re-log) a day.
async fn log_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<LogDayRequest>,
) -> Result<Json<LogDayResponse>> {
    let write = body.into_write();
    tracing::debug!(
        user_id = %user.user_id,
        date = %write.date,
        day_number = write.day_number,
        "Logging day"
    );

    let outcome = state.challenge.log_day(&user.user_id, write).await?;

    Ok(Json(LogDayResponse {
        success: true,
        log: outcome.log.into(),
        total_score: outcome.total_score,
    }))
}

/// All of the caller's logs, date ascending.
async fn get_logs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<DailyLogResponse>>> {
    let logs = state.challenge.logs(&user.user_id).await?;
    Ok(Json(logs.into_iter().map(DailyLogResponse::from).collect()))
}

// ─── Status ──────────────────────────────────────────────────

/// Current challenge status (server date, active day, grace window).
async fn get_status(State(state): State<Arc<AppState>>) -> Json<ChallengeStatus> {
    Json(state.challenge.status())
}

// ─── Drift Recovery ──────────────────────────────────────────

/// Recompute the caller's total from their logs.
async fn reconcile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TotalRecompute>> {
    Ok(Json(state.challenge.reconcile_total(&user.user_id).await?))
}
