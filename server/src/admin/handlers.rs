//! Admin HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use poll_common::TalliedPoll;
use tracing::info;
use uuid::Uuid;

use super::types::{AdminError, AdminStatusResponse, SystemAdminUser};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::with_timeout;

/// Check whether the current user is a system admin.
///
/// GET /api/admin/status
#[utoipa::path(
    get,
    path = "/api/admin/status",
    tag = "admin",
    responses((status = 200, description = "Admin status", body = AdminStatusResponse)),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn get_admin_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<AdminStatusResponse>, AdminError> {
    let is_admin = with_timeout(
        state.config.backend_timeout(),
        state.users.is_system_admin(auth.id),
    )
    .await?;

    Ok(Json(AdminStatusResponse { is_admin }))
}

/// List every poll with its tally.
///
/// GET /api/admin/polls
#[utoipa::path(
    get,
    path = "/api/admin/polls",
    tag = "admin",
    operation_id = "admin_list_polls",
    responses(
        (status = 200, description = "All polls", body = Vec<TalliedPoll>),
        (status = 403, description = "Not a system admin")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, admin), fields(admin_id = %admin.user_id))]
pub async fn list_polls(
    State(state): State<AppState>,
    Extension(admin): Extension<SystemAdminUser>,
) -> Result<Json<Vec<TalliedPoll>>, AdminError> {
    Ok(Json(state.polls.list_all_polls().await?))
}

/// Delete any poll.
///
/// DELETE /api/admin/polls/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/polls/{id}",
    tag = "admin",
    operation_id = "admin_delete_poll",
    params(("id" = Uuid, Path, description = "Poll ID")),
    responses(
        (status = 204, description = "Poll deleted"),
        (status = 403, description = "Not a system admin"),
        (status = 404, description = "Poll not found")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, admin), fields(admin_id = %admin.user_id))]
pub async fn delete_poll(
    State(state): State<AppState>,
    Extension(admin): Extension<SystemAdminUser>,
    Path(poll_id): Path<Uuid>,
) -> Result<StatusCode, AdminError> {
    state.polls.delete_any_poll(poll_id).await?;
    info!(poll_id = %poll_id, admin = %admin.name, "Admin deleted poll");
    Ok(StatusCode::NO_CONTENT)
}
