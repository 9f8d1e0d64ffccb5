// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User account model for storage and API.

use serde::{Deserialize, Serialize};

/// Discord CDN base for user avatars.
const DISCORD_AVATAR_BASE: &str = "https://cdn.discordapp.com/avatars";
/// Avatar shown for accounts without a custom Discord avatar.
const DISCORD_DEFAULT_AVATAR: &str = "https://cdn.discordapp.com/embed/avatars/0.png";

/// User account stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable identity from the auth provider (also used as document ID)
    pub external_id: String,
    /// Display name, refreshed on each login
    pub display_name: String,
    /// Avatar URL, refreshed on each login
    pub avatar_url: String,
    /// Challenge goals, fixed once the challenge starts
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub challenge_started: bool,
    /// When the user started the challenge (RFC3339, reference timezone)
    #[serde(default)]
    pub challenge_start_date: Option<String>,
    /// Sum of daily scores, one-tenth precision
    #[serde(default)]
    pub total_score: f64,
    pub created_at: String,
    pub last_login: String,
}

impl User {
    /// A fresh account that has not started the challenge.
    pub fn new(external_id: &str, display_name: &str, avatar_url: &str, now: &str) -> Self {
        Self {
            external_id: external_id.to_string(),
            display_name: display_name.to_string(),
            avatar_url: avatar_url.to_string(),
            goals: Vec::new(),
            challenge_started: false,
            challenge_start_date: None,
            total_score: 0.0,
            created_at: now.to_string(),
            last_login: now.to_string(),
        }
    }
}

/// Identity yielded by the auth provider after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub external_id: String,
    pub display_name: String,
    /// Provider-specific avatar hash, if the user set one
    pub avatar_hint: Option<String>,
}

impl ExternalIdentity {
    pub fn avatar_url(&self) -> String {
        avatar_url(&self.external_id, self.avatar_hint.as_deref())
    }
}

/// Derive the avatar URL for a Discord user.
pub fn avatar_url(external_id: &str, avatar_hash: Option<&str>) -> String {
    match avatar_hash {
        Some(hash) if !hash.is_empty() => {
            format!("{}/{}/{}.png", DISCORD_AVATAR_BASE, external_id, hash)
        }
        _ => DISCORD_DEFAULT_AVATAR.to_string(),
    }
}
