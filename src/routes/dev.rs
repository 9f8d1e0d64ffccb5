// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Development-only time travel.
//!
//! Only mounted when `ENABLE_DEV_ROUTES` is set. Moving the clock affects
//! every request served by this process.

use crate::error::{AppError, Result};
use crate::services::calendar::ChallengeStatus;
use crate::time_utils::{format_reference_rfc3339, parse_date, reference_local};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Local hour used when only a date is supplied.
const DATE_ONLY_HOUR: u32 = 12;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/dev/set-time", post(set_time))
}

#[derive(Debug, Deserialize)]
pub struct SetTimeRequest {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTimeResponse {
    pub message: String,
    pub server_time: String,
    pub challenge_status: ChallengeStatus,
}

/// Parse `YYYY-MM-DD` (noon local) or a full RFC 3339 instant.
fn parse_target(raw: &str) -> Option<DateTime<Utc>> {
    if raw.len() == 10 {
        return parse_date(raw).map(|date| reference_local(date, DATE_ONLY_HOUR).with_timezone(&Utc));
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

/// Set or clear the virtual clock. A request without a JSON body clears it.
async fn set_time(
    State(state): State<Arc<AppState>>,
    body: Option<Json<SetTimeRequest>>,
) -> Result<Json<SetTimeResponse>> {
    let clock = state.challenge.calendar().clock();
    let date = body.and_then(|Json(body)| body.date);

    let message = match date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        None => {
            clock.set_override(None);
            "Time reset to real server time.".to_string()
        }
        Some(raw) => {
            let target = parse_target(raw).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid date: {}", raw))
            })?;
            clock.set_override(Some(target));
            format!("Time traveled to {}", format_reference_rfc3339(clock.now()))
        }
    };

    Ok(Json(SetTimeResponse {
        message,
        server_time: format_reference_rfc3339(clock.now()),
        challenge_status: state.challenge.status(),
    }))
}
