// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only leaderboard projection.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::User;

/// Number of accounts shown on the leaderboard.
pub const LEADERBOARD_SIZE: u32 = 50;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub avatar_url: String,
    pub total_score: f64,
    pub challenge_start_date: Option<String>,
}

impl From<&User> for LeaderboardEntry {
    fn from(user: &User) -> Self {
        Self {
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            total_score: user.total_score,
            challenge_start_date: user.challenge_start_date.clone(),
        }
    }
}

/// Rank accounts: started only, highest score first, at most `limit`.
///
/// Ties keep their input order.
pub fn rank(users: impl IntoIterator<Item = User>, limit: u32) -> Vec<LeaderboardEntry> {
    let mut started: Vec<User> = users.into_iter().filter(|u| u.challenge_started).collect();
    started.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));

    started
        .iter()
        .take(limit as usize)
        .map(LeaderboardEntry::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, score: f64, started: bool) -> User {
        let mut u = User::new(id, id, "avatar", "now");
        u.total_score = score;
        u.challenge_started = started;
        u
    }

    #[test]
    fn test_rank_excludes_unstarted() {
        let ranked = rank(
            vec![user("a", 5.0, true), user("b", 99.0, false), user("c", 7.5, true)],
            LEADERBOARD_SIZE,
        );

        let names: Vec<&str> = ranked.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn test_rank_respects_limit() {
        let users = (0..60).map(|i| user(&format!("u{i}"), f64::from(i), true));
        let ranked = rank(users, LEADERBOARD_SIZE);

        assert_eq!(ranked.len(), 50);
        assert_eq!(ranked[0].total_score, 59.0);
        assert_eq!(ranked[49].total_score, 10.0);
    }
}
