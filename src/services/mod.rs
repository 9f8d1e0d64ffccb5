// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendar;
pub mod challenge;
pub mod clock;
pub mod discord;
pub mod scoring;

pub use calendar::{ChallengeCalendar, ChallengePhase, ChallengeStatus};
pub use challenge::{ChallengeService, LogOutcome};
pub use clock::{Clock, FixedTimeSource, SystemTimeSource, TimeSource};
pub use discord::DiscordClient;
