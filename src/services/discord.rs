// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Discord OAuth client.
//!
//! Only the `identify` scope is used: the code is exchanged for an access
//! token, which is used once to read the user's ID, name and avatar hash.
//! Discord tokens are not stored.

use crate::error::AppError;
use crate::models::ExternalIdentity;
use serde::Deserialize;

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const DISCORD_AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";

/// Discord API client.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl DiscordClient {
    /// Create a new Discord client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DISCORD_API_BASE.to_string(),
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    /// Authorization URL the user is redirected to.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope=identify&state={}",
            DISCORD_AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code and resolve the user's identity.
    pub async fn authenticate(&self, code: &str) -> Result<ExternalIdentity, AppError> {
        let token = self.exchange_code(code).await?;
        let user = self.get_current_user(&token.access_token).await?;

        Ok(user.into_identity())
    }

    /// Exchange authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/oauth2/token", self.base_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::DiscordApi(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Discord token exchange failed");
            return Err(AppError::DiscordApi(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::DiscordApi(format!("Failed to parse token response: {}", e)))
    }

    /// Get the authenticated user's profile.
    async fn get_current_user(&self, access_token: &str) -> Result<DiscordUser, AppError> {
        let response = self
            .http
            .get(format!("{}/users/@me", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::DiscordApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            if status.as_u16() == 429 {
                tracing::warn!("Discord rate limit hit (429)");
            }
            return Err(AppError::DiscordApi(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::DiscordApi(format!("JSON parse error: {}", e)))
    }
}

/// Token exchange response from Discord OAuth.
#[derive(Debug, Clone, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
}

/// User object from `GET /users/@me`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl DiscordUser {
    /// Display name is the Discord global name, or the username when unset.
    pub fn into_identity(self) -> ExternalIdentity {
        let display_name = self
            .global_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.username);

        ExternalIdentity {
            display_name,
            external_id: self.id,
            avatar_hint: self.avatar,
        }
    }
}
