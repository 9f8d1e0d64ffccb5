// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Malformed or missing input.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Challenge already started")]
    ChallengeAlreadyStarted,

    #[error("Challenge not started")]
    ChallengeNotStarted,

    /// The requested date is outside the logging window.
    #[error("Date locked: {0}")]
    DateLocked(String),

    #[error("Discord API error: {0}")]
    DiscordApi(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error is a policy rejection (valid input, disallowed action).
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            AppError::ChallengeAlreadyStarted
                | AppError::ChallengeNotStarted
                | AppError::DateLocked(_)
        )
    }
}

impl From<firestore::errors::FirestoreError> for AppError {
    fn from(err: firestore::errors::FirestoreError) -> Self {
        AppError::Database(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::ChallengeAlreadyStarted => (
                StatusCode::BAD_REQUEST,
                "challenge_already_started",
                Some("Challenge already started.".to_string()),
            ),
            AppError::ChallengeNotStarted => (
                StatusCode::FORBIDDEN,
                "challenge_not_started",
                Some("Start the challenge before logging a day.".to_string()),
            ),
            AppError::DateLocked(msg) => (StatusCode::FORBIDDEN, "date_locked", Some(msg.clone())),
            AppError::DiscordApi(msg) => {
                tracing::warn!(error = %msg, "Discord API error");
                (StatusCode::BAD_GATEWAY, "discord_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
