//! Rate limiting error types for HTTP responses.

use axum::http::header::HeaderValue;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during attempt checks.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Attempt store could not be reached. Auth requests fail closed.
    #[error("Attempt store unavailable: {0}")]
    StoreUnavailable(String),

    /// Too many attempts inside the lockout window.
    #[error("Too many failed attempts")]
    LimitExceeded { retry_after: u64 },
}

/// JSON response body for rate limit errors.
#[derive(Serialize)]
pub struct RateLimitErrorResponse {
    /// Error code identifier.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Seconds to wait before retrying.
    pub retry_after: u64,
}

/// Lockout message shown to users.
pub fn lockout_message(retry_after: u64) -> String {
    let minutes = retry_after.div_ceil(60).max(1);
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    format!("Too many failed attempts. Please try again in {minutes} {unit}.")
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        match self {
            Self::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "error": "service_unavailable",
                    "message": "Sign-in is temporarily unavailable. Please try again later.",
                })),
            )
                .into_response(),
            Self::LimitExceeded { retry_after } => {
                let body = RateLimitErrorResponse {
                    error: "rate_limited",
                    message: lockout_message(retry_after),
                    retry_after,
                };
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert("Retry-After", v);
                }
                response
            }
        }
    }
}
