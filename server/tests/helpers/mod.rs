//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router. The app runs on the in-memory store and a manual clock, so these
//! tests need neither `PostgreSQL` nor Redis.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, header, Method, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use poll_server::api::{create_router, AppState};
use poll_server::config::Config;
use poll_server::db::MemoryStore;
use poll_server::ratelimit::{AttemptLimitConfig, AttemptLimiter, ManualClock, MemoryAttemptStore};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

/// Password that satisfies every strength rule.
pub const PASSWORD: &str = "Str0ng!Passw0rd";

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a test app with the default test configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default_for_test(), AttemptLimitConfig::default())
    }

    /// Create a test app with custom server and limiter configuration.
    pub fn with_config(config: Config, limits: AttemptLimitConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let limiter = AttemptLimiter::new(
            Arc::new(MemoryAttemptStore::new()),
            clock.clone(),
            limits,
        );

        let state = AppState::new(config.clone(), store.clone(), store.clone(), limiter);
        let router = create_router(state);

        Self {
            router,
            store,
            clock,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Send a request with an optional JSON body and bearer token.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Self::request(method, uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.oneshot(builder.body(body).unwrap()).await
    }

    /// Register a user and return `(user_id, access_token)`.
    pub async fn register(&self, name: &str, email: &str) -> (Uuid, String) {
        let resp = self
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK, "registration failed");

        let body = body_json(resp).await;
        let user_id = body["user"]["id"].as_str().unwrap().parse().unwrap();
        let token = body["access_token"].as_str().unwrap().to_string();
        (user_id, token)
    }

    /// Attempt a sign-in.
    pub async fn login(&self, email: &str, password: &str) -> Response<Body> {
        self.send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Create a poll and return its JSON.
    pub async fn create_poll(&self, token: &str, title: &str, options: &[&str]) -> Value {
        let resp = self
            .send(
                Method::POST,
                "/api/polls",
                Some(token),
                Some(json!({ "title": title, "options": options })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED, "poll creation failed");
        body_json(resp).await
    }
}

// ============================================================================
// Response helpers
// ============================================================================

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Response is not JSON")
}

/// ID of the option with the given text in a poll JSON.
pub fn option_id(poll: &Value, text: &str) -> String {
    poll["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["option_text"] == text)
        .and_then(|o| o["id"].as_str())
        .unwrap()
        .to_string()
}
