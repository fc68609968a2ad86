//! System Admin Module
//!
//! - Any authenticated user: check own admin status
//! - System admins: list every poll with tallies, delete any poll

pub mod handlers;
pub mod middleware;
pub mod types;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get},
    Router,
};

use crate::api::AppState;

pub use middleware::require_system_admin;
pub use types::{AdminError, AdminStatusResponse, SystemAdminUser};

/// Create the admin router.
///
/// Expects `require_auth` to be applied by the caller. Poll routes also
/// require system admin privileges.
pub fn router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/polls", get(handlers::list_polls))
        .route("/polls/{id}", delete(handlers::delete_poll))
        .layer(from_fn_with_state(state, require_system_admin));

    // /status lets users check their own admin status
    Router::new()
        .route("/status", get(handlers::get_admin_status))
        .merge(admin_routes)
}
