// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consistency Challenge API Server
//!
//! Runs the 21-day challenge backend: Discord sign-in, daily logging and
//! the public leaderboard.

use consistency_challenge::{
    config::{Config, StorageBackend},
    db::{ChallengeStore, FirestoreDb, MemoryDb},
    services::{ChallengeCalendar, ChallengeService, Clock, DiscordClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        start_date = %config.challenge_start_date,
        "Starting Consistency Challenge API"
    );

    let store: Arc<dyn ChallengeStore> = match config.storage_backend {
        StorageBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            tracing::info!(project = %config.gcp_project_id, "Firestore connected");
            Arc::new(db)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data will not survive a restart");
            Arc::new(MemoryDb::new())
        }
    };

    let clock = Arc::new(Clock::system());
    let calendar = ChallengeCalendar::new(config.challenge_start_date, clock);
    let challenge = ChallengeService::new(calendar, store);

    let discord = DiscordClient::new(
        config.discord_client_id.clone(),
        config.discord_client_secret.clone(),
        config.discord_callback_url.clone(),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        challenge,
        discord,
    });

    // Build router
    let app = consistency_challenge::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("consistency_challenge=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
