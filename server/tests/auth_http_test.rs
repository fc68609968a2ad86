//! HTTP-level authentication tests.
//!
//! Covers registration rules, sign-in, session revocation and the failed
//! attempt lockout. The limiter runs on a manual clock, so window expiry is
//! simulated instead of waited for.
//!
//! Run with: `cargo test --test auth_http_test`

mod helpers;

use axum::http::{Method, StatusCode};
use helpers::{body_json, TestApp, PASSWORD};
use poll_server::auth::INVALID_CREDENTIALS_MESSAGE;
use poll_server::config::Config;
use poll_server::ratelimit::{AttemptLimitConfig, AttemptPolicy};
use serde_json::json;

#[tokio::test]
async fn test_register_returns_token_and_profile() {
    let app = TestApp::new();

    let resp = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "  Ada Lovelace ",
                "email": "  Ada@Example.COM ",
                "password": PASSWORD,
                "confirm_password": PASSWORD
            })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["name"], "Ada Lovelace");
    assert_eq!(body["user"]["email"], "ada@example.com");

    let token = body["access_token"].as_str().unwrap();
    let resp = app.send(Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["email"], "ada@example.com");
}

#[tokio::test]
async fn test_register_rejects_weak_input() {
    let app = TestApp::new();

    let resp = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "R2-D2",
                "email": "not-an-email",
                "password": "password",
                "confirm_password": "different"
            })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    let details: Vec<_> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_str().unwrap().to_string())
        .collect();
    assert!(details.iter().any(|d| d.contains("letters")));
    assert!(details.iter().any(|d| d.contains("valid email")));
    assert!(details.iter().any(|d| d.contains("uppercase")));
    assert!(details.contains(&"Passwords do not match".to_string()));
}

#[tokio::test]
async fn test_login_without_password_gets_json_error() {
    let app = TestApp::new();

    let resp = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ada@example.com" })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid_body");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new();
    app.register("Ada", "ada@example.com").await;

    let resp = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "name": "Imposter", "email": "ADA@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(resp).await["message"],
        "An account with this email already exists."
    );
}

#[tokio::test]
async fn test_login_success_and_failure_look_alike() {
    let app = TestApp::new();
    app.register("Ada", "ada@example.com").await;

    let resp = app.login("ada@example.com", PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let wrong_password = body_json(app.login("ada@example.com", "Wr0ng!pass").await).await;
    let unknown_user = body_json(app.login("nobody@example.com", "Wr0ng!pass").await).await;
    assert_eq!(wrong_password["message"], INVALID_CREDENTIALS_MESSAGE);
    assert_eq!(unknown_user["message"], INVALID_CREDENTIALS_MESSAGE);
    assert_eq!(wrong_password["error"], unknown_user["error"]);
}

#[tokio::test]
async fn test_lockout_after_max_attempts() {
    let app = TestApp::new();
    app.register("Ada", "ada@example.com").await;

    for expected_remaining in (0..5).rev() {
        let resp = app.login("ada@example.com", "Wr0ng!pass").await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["remaining_attempts"], expected_remaining);
    }

    // Locked out even with the right password
    let resp = app.login("ada@example.com", PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key("retry-after"));
    let body = body_json(resp).await;
    assert_eq!(body["error"], "rate_limited");
    assert_eq!(
        body["message"],
        "Too many failed attempts. Please try again in 15 minutes."
    );

    // Window elapses
    app.clock.advance(chrono::Duration::seconds(901));

    let resp = app.login("ada@example.com", PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_lockout_is_per_email_and_case_insensitive() {
    let app = TestApp::new();

    for _ in 0..5 {
        app.login("Ada@Example.com", "Wr0ng!pass").await;
    }
    let resp = app.login("ada@example.com", "Wr0ng!pass").await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let resp = app.login("grace@example.com", "Wr0ng!pass").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_successful_login_resets_attempts() {
    let limits = AttemptLimitConfig {
        policy: AttemptPolicy {
            max_attempts: 3,
            window_secs: 60,
        },
        ..AttemptLimitConfig::default()
    };
    let app = TestApp::with_config(Config::default_for_test(), limits);
    app.register("Ada", "ada@example.com").await;

    for _ in 0..2 {
        app.login("ada@example.com", "Wr0ng!pass").await;
    }
    assert_eq!(
        app.login("ada@example.com", PASSWORD).await.status(),
        StatusCode::OK
    );

    // Fresh budget after success
    let resp = app.login("ada@example.com", "Wr0ng!pass").await;
    assert_eq!(body_json(resp).await["remaining_attempts"], 2);
}

#[tokio::test]
async fn test_register_is_attempt_limited() {
    let limits = AttemptLimitConfig {
        policy: AttemptPolicy {
            max_attempts: 2,
            window_secs: 60,
        },
        ..AttemptLimitConfig::default()
    };
    let app = TestApp::with_config(Config::default_for_test(), limits);
    app.register("Ada", "ada@example.com").await;

    // Duplicate registrations count against the register scope only
    for _ in 0..2 {
        let resp = app
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "name": "Ada", "email": "ada@example.com", "password": PASSWORD })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
    let resp = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    assert_eq!(
        app.login("ada@example.com", PASSWORD).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_disabled_limiter_never_locks_out() {
    let limits = AttemptLimitConfig {
        enabled: false,
        ..AttemptLimitConfig::default()
    };
    let app = TestApp::with_config(Config::default_for_test(), limits);

    for _ in 0..10 {
        let resp = app.login("ada@example.com", "Wr0ng!pass").await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = TestApp::new();
    let (user_id, token) = app.register("Ada", "ada@example.com").await;

    let resp = app.send(Method::GET, "/auth/session", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["user_id"], user_id.to_string());

    let resp = app.send(Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.send(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let app = TestApp::new();

    let resp = app.send(Method::GET, "/auth/me", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "MISSING_AUTH");

    let resp = app
        .send(Method::GET, "/auth/me", Some("garbage"), None)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let resp = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["rate_limiting"], true);
}
