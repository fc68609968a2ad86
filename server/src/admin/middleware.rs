//! Admin authorization middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::types::{AdminError, SystemAdminUser};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::with_timeout;

/// Middleware that requires the user to be a system admin.
///
/// Must run after `require_auth`.
#[tracing::instrument(skip(state, request, next))]
pub async fn require_system_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AdminError> {
    let auth = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AdminError::NotAdmin)?;

    let is_admin = with_timeout(
        state.config.backend_timeout(),
        state.users.is_system_admin(auth.id),
    )
    .await?;
    if !is_admin {
        return Err(AdminError::NotAdmin);
    }

    request.extensions_mut().insert(SystemAdminUser {
        user_id: auth.id,
        name: auth.name,
    });

    Ok(next.run(request).await)
}
