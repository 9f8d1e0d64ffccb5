// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Discord OAuth authentication routes.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::auth::{authenticate, create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::routes::challenge::UserResponse;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// OAuth state older than this is rejected.
const OAUTH_STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

/// Frontend path users land on after login.
const POST_LOGIN_PATH: &str = "/consistency-challenge";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/discord", get(auth_start))
        .route("/auth/discord/callback", get(auth_callback))
        .route("/auth/me", get(auth_me))
        .route("/auth/logout", post(logout))
}

/// Start OAuth flow - redirect to Discord authorization.
async fn auth_start(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let oauth_state = sign_state(
        &state.config.frontend_url,
        timestamp,
        &state.config.oauth_state_key,
    )?;

    tracing::info!(
        client_id = %state.config.discord_client_id,
        "Starting OAuth flow, redirecting to Discord"
    );

    Ok(Redirect::temporary(&state.discord.authorize_url(&oauth_state)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code, upsert the account, create session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let frontend_url = params
        .state
        .as_deref()
        .and_then(|s| verify_and_decode_state(s, &state.config.oauth_state_key, now_ms))
        .ok_or_else(|| {
            tracing::warn!("Invalid, expired or tampered OAuth state parameter");
            AppError::BadRequest("Invalid OAuth state".to_string())
        })?;

    // Check for OAuth errors (e.g. the user denied access)
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Discord");
        let redirect = format!("{}?error={}", frontend_url, urlencoding::encode(&error));
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for Discord identity");
    let identity = state.discord.authenticate(&code).await?;
    let user = state.challenge.sign_in(&identity).await?;

    let jwt = create_jwt(&user.external_id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let secure = !is_local(&frontend_url);
    let jar = jar.add(session_cookie(jwt, secure));

    Ok((
        jar,
        Redirect::temporary(&format!("{}{}", frontend_url, POST_LOGIN_PATH)),
    ))
}

/// Session status response.
#[derive(Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

/// Report whether the caller has a valid session. Never 401s.
async fn auth_me(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<MeResponse>> {
    let Some(auth) = authenticate(&jar, &headers, &state.config.jwt_signing_key) else {
        return Ok(Json(MeResponse {
            authenticated: false,
            user: None,
        }));
    };

    let user = state.challenge.find_user(&auth.user_id).await?;

    Ok(Json(MeResponse {
        authenticated: user.is_some(),
        user: user.map(UserResponse::from),
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Logout - clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    let secure = !is_local(&state.config.frontend_url);
    let jar = jar.remove(session_cookie(String::new(), secure));

    (
        jar,
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Session cookie with matching attributes for creation and removal.
fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

fn is_local(url: &str) -> bool {
    url.contains("localhost") || url.contains("127.0.0.1")
}

/// Sign "frontend_url|timestamp_hex" and base64 the result.
fn sign_state(frontend_url: &str, timestamp_ms: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", frontend_url, timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify HMAC signature and age, and decode the frontend URL.
fn verify_and_decode_state(state: &str, secret: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "frontend_url|timestamp_hex|signature_hex"; the URL itself
    // may not contain '|', so split from the right.
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let frontend_url = parts.next()?;

    let payload = format!("{}|{}", frontend_url, timestamp_hex);
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_ms = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(issued_ms) > OAUTH_STATE_MAX_AGE_MS {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(frontend_url.to_string())
}
