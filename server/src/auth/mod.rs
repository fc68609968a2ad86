//! Authentication Service
//!
//! Email/password accounts, session-bound access tokens and the brute force
//! guard on sign-in and sign-up.

mod error;
pub mod handlers;
pub mod jwt;
mod middleware;
pub mod password;
pub mod validation;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};

use crate::api::AppState;

pub use error::{AuthError, AuthResult, ErrorResponse, INVALID_CREDENTIALS_MESSAGE};
pub use handlers::{AuthResponse, LoginRequest, RegisterRequest, SessionInfo, UserProfile};
pub use middleware::{optional_auth, require_auth, AuthUser, MaybeAuthUser};

/// Create authentication router.
///
/// Public routes (attempt limited inside the handlers):
/// - POST /register - Register a new user
/// - POST /login - Sign in with email/password
///
/// Protected routes (auth required):
/// - POST /logout - Invalidate session
/// - GET /me - Get current user profile
/// - GET /session - Get current session
pub fn router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login));

    let protected_routes = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::get_profile))
        .route("/session", get(handlers::get_session))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(protected_routes)
}
