// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily log model: one entry per user per calendar date.

use serde::{Deserialize, Serialize};

/// Stored daily log record in Firestore.
///
/// Document ID is `{user_id}_{date}`, which makes (user, date) unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    /// Owner's external ID
    pub user_id: String,
    /// Calendar date (`YYYY-MM-DD`, reference timezone)
    pub date: String,
    /// Challenge day this log was submitted for (informational)
    pub day_number: u32,
    /// One flag per goal, in goal order
    pub completed_tasks: Vec<bool>,
    /// Derived score in [0, 10], one-tenth precision
    pub daily_score: f64,
    /// Free text, at most 500 characters
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DailyLog {
    pub fn document_id(&self) -> String {
        document_id(&self.user_id, &self.date)
    }
}

/// Document ID for a (user, date) pair.
pub fn document_id(user_id: &str, date: &str) -> String {
    format!("{}_{}", urlencoding::encode(user_id), date)
}
