//! Admin module types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::StoreError;
use crate::polls::PollError;

/// Authenticated system admin user.
#[derive(Debug, Clone)]
pub struct SystemAdminUser {
    pub user_id: Uuid,
    pub name: String,
}

/// Admin API error type.
#[derive(Debug, Error)]
pub enum AdminError {
    /// User is not a system admin.
    #[error("System admin privileges required")]
    NotAdmin,

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Storage error.
    #[error("Storage error")]
    Store(#[from] StoreError),
}

impl From<PollError> for AdminError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Store(e) => Self::Store(e),
            // Unscoped deletes only fail on a missing poll
            _ => Self::NotFound("Poll"),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotAdmin => (
                StatusCode::FORBIDDEN,
                serde_json::json!({"error": "not_admin", "message": "System admin privileges required"}),
            ),
            Self::NotFound(what) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({"error": "not_found", "message": format!("{what} not found")}),
            ),
            Self::Store(StoreError::Timeout(limit)) => {
                error!(timeout = ?limit, "Admin storage call timed out");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    serde_json::json!({"error": "backend_unavailable", "message": "Something went wrong. Please try again later."}),
                )
            }
            Self::Store(e) => {
                error!(error = %e, "Admin storage call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({"error": "backend_error", "message": "Something went wrong. Please try again later."}),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Admin status of the current user.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStatusResponse {
    pub is_admin: bool,
}
