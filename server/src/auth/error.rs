//! Authentication Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;
use crate::ratelimit::RateLimitError;

/// Generic message for failed sign-in. Never reveals whether the email exists.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password. Please try again.";

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password. Carries the attempts left before lockout.
    #[error("Invalid email or password. Please try again.")]
    InvalidCredentials { remaining_attempts: Option<u32> },

    /// Email already registered.
    #[error("An account with this email already exists.")]
    EmailTaken,

    /// Invalid or expired token.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Missing Authorization header.
    #[error("Missing authorization header")]
    MissingAuthHeader,

    /// Invalid authorization header format.
    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    /// Validation error.
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    /// Too many attempts, or the attempt store is down.
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    /// Password hashing error.
    #[error("Password processing failed")]
    PasswordHash,

    /// Storage error.
    #[error("Storage error")]
    Store(#[from] StoreError),

    /// JWT error.
    #[error("Token error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Internal server error.
    #[error("Internal server error")]
    Internal(String),
}

impl AuthError {
    /// Validation error from a list of field problems.
    pub fn validation(details: Vec<String>) -> Self {
        let message = details
            .first()
            .cloned()
            .unwrap_or_else(|| "Invalid input".to_string());
        Self::Validation { message, details }
    }
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Attempts left before lockout (failed sign-in only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,
    /// Field-level validation problems.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Lockouts keep the rate limit body and Retry-After header
        if let Self::RateLimit(inner) = self {
            return inner.into_response();
        }

        let (status, code) = match &self {
            Self::RateLimit(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::InvalidCredentials { .. } => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            Self::EmailTaken => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            Self::MissingAuthHeader => (StatusCode::UNAUTHORIZED, "MISSING_AUTH"),
            Self::InvalidAuthHeader => (StatusCode::UNAUTHORIZED, "INVALID_AUTH_HEADER"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Store(StoreError::Timeout(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            Self::Store(_) | Self::PasswordHash | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            Self::Jwt(_) => (StatusCode::UNAUTHORIZED, "TOKEN_ERROR"),
        };

        if status.is_server_error() {
            error!(error = ?self, "Authentication request failed");
        }

        let remaining_attempts = match &self {
            Self::InvalidCredentials { remaining_attempts } => *remaining_attempts,
            _ => None,
        };
        let details = match &self {
            Self::Validation { details, .. } => details.clone(),
            _ => Vec::new(),
        };
        // Server-side details stay in the logs
        let message = if status.is_server_error() {
            "Something went wrong. Please try again later.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
            remaining_attempts,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
