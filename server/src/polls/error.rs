//! Poll Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use poll_common::DraftErrors;
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;

/// Poll operation errors.
#[derive(Debug, Error)]
pub enum PollError {
    /// Bad poll input, rejected before any storage call.
    #[error(transparent)]
    Validation(#[from] DraftErrors),

    /// No signed-in user where one is required.
    #[error("You must be logged in to {action}.")]
    Unauthenticated { action: &'static str },

    /// Caller does not own the poll.
    #[error("You can only change polls you created.")]
    Forbidden,

    /// Poll does not exist.
    #[error("Poll not found")]
    NotFound,

    /// Option does not belong to the poll.
    #[error("That option does not belong to this poll.")]
    OptionNotInPoll,

    /// Caller already voted and only one vote per user is allowed.
    #[error("You have already voted on this poll.")]
    AlreadyVoted,

    /// Storage error.
    #[error("Storage error")]
    Store(#[from] StoreError),
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.first().code()),
            Self::Unauthenticated { .. } => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            Self::NotFound => (StatusCode::NOT_FOUND, "poll_not_found"),
            Self::OptionNotInPoll => (StatusCode::BAD_REQUEST, "option_not_in_poll"),
            Self::AlreadyVoted => (StatusCode::CONFLICT, "already_voted"),
            Self::Store(StoreError::Timeout(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "backend_unavailable")
            }
            Self::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "backend_error"),
        };

        let message = if let Self::Store(e) = &self {
            error!(error = %e, "Poll storage call failed");
            "Something went wrong. Please try again later.".to_string()
        } else {
            self.to_string()
        };

        let body = match &self {
            Self::Validation(e) => serde_json::json!({
                "error": code,
                "message": message,
                "details": e.messages(),
            }),
            _ => serde_json::json!({ "error": code, "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for poll operations.
pub type PollResult<T> = Result<T, PollError>;
