// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Consistency Challenge: a 21-day daily-goal tracker
//!
//! This crate provides the backend API: Discord sign-in, goal setup,
//! daily check-ins scored against the challenge calendar, and a public
//! leaderboard.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{ChallengeService, DiscordClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub challenge: ChallengeService,
    pub discord: DiscordClient,
}
