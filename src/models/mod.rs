// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod daily_log;
pub mod leaderboard;
pub mod user;

pub use daily_log::DailyLog;
pub use leaderboard::LeaderboardEntry;
pub use user::{ExternalIdentity, User};
