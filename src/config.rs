//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup. Secrets are injected as environment variables by
//! the deployment (or a local `.env` file during development).

use chrono::NaiveDate;
use std::env;

use crate::time_utils::parse_date;

/// First day of the challenge (day 1) when not configured.
pub const DEFAULT_CHALLENGE_START_DATE: &str = "2026-01-19";

/// Where challenge data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    /// Process-local store; for tests and local demos only.
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Discord OAuth client ID (public)
    pub discord_client_id: String,
    /// OAuth redirect URI registered with Discord
    pub discord_callback_url: String,
    /// Frontend URL for OAuth redirects and CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Day 1 of the challenge, in the reference timezone
    pub challenge_start_date: NaiveDate,
    /// Mount the time-travel endpoint
    pub enable_dev_routes: bool,
    pub storage_backend: StorageBackend,

    // --- Secrets ---
    /// Discord OAuth client secret
    pub discord_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            discord_client_id: "test_client_id".to_string(),
            discord_callback_url: "http://localhost:8080/auth/discord/callback".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            challenge_start_date: NaiveDate::from_ymd_opt(2026, 1, 19)
                .unwrap_or(NaiveDate::MIN),
            enable_dev_routes: true,
            storage_backend: StorageBackend::Memory,
            discord_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .into_bytes();

        let challenge_start_date = match env::var("CHALLENGE_START_DATE") {
            Ok(raw) => parse_date(raw.trim()).ok_or(ConfigError::Invalid {
                name: "CHALLENGE_START_DATE",
                reason: "expected YYYY-MM-DD",
            })?,
            Err(_) => parse_date(DEFAULT_CHALLENGE_START_DATE).ok_or(ConfigError::Invalid {
                name: "CHALLENGE_START_DATE",
                reason: "built-in default is not a date",
            })?,
        };

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StorageBackend::Firestore,
            "memory" => StorageBackend::Memory,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    reason: "expected 'firestore' or 'memory'",
                })
            }
        };

        Ok(Self {
            // Non-sensitive config from env
            discord_client_id: env::var("DISCORD_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("DISCORD_CLIENT_ID"))?,
            discord_callback_url: env::var("DISCORD_CALLBACK_URL").unwrap_or_else(|_| {
                "http://localhost:8080/auth/discord/callback".to_string()
            }),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            challenge_start_date,
            enable_dev_routes: env::var("ENABLE_DEV_ROUTES")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            storage_backend,

            // Secrets
            discord_client_secret: env::var("DISCORD_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("DISCORD_CLIENT_SECRET"))?,
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map(String::into_bytes)
                .unwrap_or_else(|_| jwt_signing_key.clone()),
            jwt_signing_key,
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid {
        name: &'static str,
        reason: &'static str,
    },
}
