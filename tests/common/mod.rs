// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{NaiveDate, Utc};
use consistency_challenge::config::Config;
use consistency_challenge::db::{ChallengeStore, FirestoreDb, MemoryDb};
use consistency_challenge::middleware::auth::create_jwt;
use consistency_challenge::models::ExternalIdentity;
use consistency_challenge::routes::create_router;
use consistency_challenge::services::{ChallengeCalendar, ChallengeService, Clock, DiscordClient};
use consistency_challenge::time_utils::reference_local;
use consistency_challenge::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Clock pinned to `date` at `hour` local time.
#[allow(dead_code)]
pub fn clock_at(date: &str, hour: u32) -> Arc<Clock> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid test date");
    Arc::new(Clock::fixed(reference_local(date, hour).with_timezone(&Utc)))
}

/// Test app over an in-memory store, pinned to a local date and hour.
/// Returns the router, the shared state and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app_at(date: &str, hour: u32) -> (axum::Router, Arc<AppState>, MemoryDb) {
    create_test_app_with_config(Config::test_default(), date, hour)
}

/// Test app pinned to day 2 of the challenge, mid-morning.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryDb) {
    create_test_app_at("2026-01-20", 11)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(
    config: Config,
    date: &str,
    hour: u32,
) -> (axum::Router, Arc<AppState>, MemoryDb) {
    let db = MemoryDb::new();
    let calendar = ChallengeCalendar::new(config.challenge_start_date, clock_at(date, hour));
    let challenge = ChallengeService::new(calendar, Arc::new(db.clone()));
    let discord = DiscordClient::new(
        config.discord_client_id.clone(),
        config.discord_client_secret.clone(),
        config.discord_callback_url.clone(),
    );

    let state = Arc::new(AppState {
        config,
        challenge,
        discord,
    });

    (create_router(state.clone()), state, db)
}

/// Create a session token for `user_id` with the test signing key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str) -> String {
    create_jwt(user_id, &Config::test_default().jwt_signing_key).expect("jwt")
}

/// Register a user directly in the store.
#[allow(dead_code)]
pub async fn seed_user(db: &MemoryDb, user_id: &str, name: &str) {
    let identity = ExternalIdentity {
        external_id: user_id.to_string(),
        display_name: name.to_string(),
        avatar_hint: None,
    };
    db.upsert_profile(&identity, "2026-01-18T12:00:00+05:30")
        .await
        .expect("seed user");
}

/// Send a JSON request, optionally authenticated.
#[allow(dead_code)]
pub async fn send_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
