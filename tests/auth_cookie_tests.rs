// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! These tests verify cookie removal attributes on logout match the creation
//! attributes for localhost and production-style domains.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use consistency_challenge::config::Config;
use tower::ServiceExt;

mod common;
use common::{create_test_app_with_config, json_body};

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

async fn logout(frontend_url: &str) -> Response {
    let config = Config {
        frontend_url: frontend_url.to_string(),
        ..Config::test_default()
    };
    let (app, _, _) = create_test_app_with_config(config, "2026-01-20", 11);

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/auth/logout")
            .header(header::COOKIE, "challenge_token=test")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let response = logout("http://localhost:5173").await;

    assert_eq!(response.status(), StatusCode::OK);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "challenge_token");

    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("SameSite=Lax"));
    assert!(token_cookie.contains("Max-Age=0"));
    assert!(!token_cookie.contains("Secure"));

    let body = json_body(response).await;
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn test_logout_cookie_removal_production_attributes() {
    let response = logout("https://challenge.example.com").await;

    assert_eq!(response.status(), StatusCode::OK);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "challenge_token");

    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("Secure"));
    assert!(token_cookie.contains("SameSite=None"));
    assert!(token_cookie.contains("Max-Age=0"));
}
