//! Authentication HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::{ApiJson, AppState};
use crate::db::{with_timeout, NewUser, StoreError, User};
use crate::ratelimit::AttemptScope;

use super::error::{AuthError, AuthResult};
use super::jwt::generate_access_token;
use super::middleware::AuthUser;
use super::password::{
    hash_password_blocking, verify_dummy_password, verify_password_blocking,
};
use super::validation::{
    error_messages, normalize_email, password_issues, sanitize_input, NAME_REGEX,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registration request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Display name (letters, spaces, hyphens, apostrophes).
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        regex(
            path = *NAME_REGEX,
            message = "Name can only contain letters, spaces, hyphens, and apostrophes"
        )
    )]
    pub name: String,
    /// Email address.
    #[validate(
        email(message = "Please enter a valid email address"),
        length(max = 254, message = "Email address is too long")
    )]
    pub email: String,
    /// Password (8-128 characters, mixed character classes).
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters long"
    ))]
    pub password: String,
    /// Optional confirmation; must match `password` when present.
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email address.
    #[validate(
        email(message = "Please enter a valid email address"),
        length(max = 254, message = "Email address is too long")
    )]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// User profile returned to the account owner.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Successful sign-in or sign-up.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token for the `Authorization` header.
    pub access_token: String,
    /// Always "Bearer".
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Current session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Create a session and sign an access token for it.
async fn start_session(state: &AppState, user: User) -> AuthResult<AuthResponse> {
    let expires_at = Utc::now() + Duration::seconds(state.config.session_expiry);
    let session = with_timeout(
        state.config.backend_timeout(),
        state.users.create_session(user.id, expires_at),
    )
    .await?;

    let access_token =
        generate_access_token(user.id, session.id, session.expires_at, &state.config.jwt_secret)?;

    Ok(AuthResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.session_expiry,
        user: user.into(),
    })
}

/// Clear attempts after success. A failure here only delays the next lockout
/// reset, so it is logged instead of failing the request.
async fn clear_attempts(state: &AppState, scope: AttemptScope, email: &str) {
    if let Err(e) = state.limiter.reset(scope, email).await {
        warn!(error = %e, scope = scope.as_str(), "Failed to reset attempt counter");
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new user.
///
/// **First User Behavior:** the first account ever created is granted system
/// admin in the same atomic step (see [`crate::db::UserStore::create_user`]).
///
/// POST /auth/register
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created and signed in", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered"),
        (status = 429, description = "Too many attempts")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(mut body): ApiJson<RegisterRequest>,
) -> AuthResult<Json<AuthResponse>> {
    body.name = body.name.trim().to_string();
    body.email = normalize_email(&body.email);

    // Validate input first
    let mut problems = match body.validate() {
        Ok(()) => Vec::new(),
        Err(e) => error_messages(&e, &["name", "email", "password"]),
    };
    problems.extend(password_issues(&body.password));
    if body
        .confirm_password
        .as_ref()
        .is_some_and(|c| *c != body.password)
    {
        problems.push("Passwords do not match".to_string());
    }
    if !problems.is_empty() {
        return Err(AuthError::validation(problems));
    }

    state
        .limiter
        .enforce(AttemptScope::Register, &body.email)
        .await?;

    let timeout = state.config.backend_timeout();
    if with_timeout(timeout, state.users.find_user_by_email(&body.email))
        .await?
        .is_some()
    {
        return Err(AuthError::EmailTaken);
    }

    let password_hash = hash_password_blocking(body.password).await?;

    // UNIQUE constraint catches concurrent registrations of the same email
    let user = with_timeout(
        timeout,
        state.users.create_user(NewUser {
            name: sanitize_input(&body.name),
            email: body.email.clone(),
            password_hash,
        }),
    )
    .await
    .map_err(|e| match e {
        StoreError::Conflict => AuthError::EmailTaken,
        other => AuthError::Store(other),
    })?;

    clear_attempts(&state, AttemptScope::Register, &body.email).await;
    info!(user_id = %user.id, "User registered");

    Ok(Json(start_session(&state, user).await?))
}

/// Sign in with email and password.
///
/// The attempt is counted before credentials are checked, and unknown emails
/// fail exactly like wrong passwords.
///
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 429, description = "Too many failed attempts")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(mut body): ApiJson<LoginRequest>,
) -> AuthResult<Json<AuthResponse>> {
    body.email = normalize_email(&body.email);
    body.validate()
        .map_err(|e| AuthError::validation(error_messages(&e, &["email", "password"])))?;

    let decision = state
        .limiter
        .enforce(AttemptScope::Login, &body.email)
        .await?;
    let invalid = AuthError::InvalidCredentials {
        remaining_attempts: decision.remaining_attempts,
    };

    let Some(user) = with_timeout(
        state.config.backend_timeout(),
        state.users.find_user_by_email(&body.email),
    )
    .await?
    else {
        verify_dummy_password(body.password).await?;
        info!(remaining = ?decision.remaining_attempts, "Failed sign-in for unknown email");
        return Err(invalid);
    };

    let valid = verify_password_blocking(body.password, user.password_hash.clone()).await?;
    if !valid {
        info!(user_id = %user.id, remaining = ?decision.remaining_attempts, "Failed sign-in");
        return Err(invalid);
    }

    clear_attempts(&state, AttemptScope::Login, &body.email).await;
    info!(user_id = %user.id, "User signed in");

    Ok(Json(start_session(&state, user).await?))
}

/// Sign out and invalidate the current session.
///
/// POST /auth/logout
#[tracing::instrument(skip(state), fields(user_id = %auth_user.id))]
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AuthResult<StatusCode> {
    with_timeout(
        state.config.backend_timeout(),
        state.users.delete_session(auth_user.session_id),
    )
    .await?;

    info!(user_id = %auth_user.id, "User signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// Get current user profile.
///
/// GET /auth/me
pub async fn get_profile(auth_user: AuthUser) -> Json<UserProfile> {
    Json(UserProfile {
        id: auth_user.id,
        name: auth_user.name,
        email: auth_user.email,
        created_at: auth_user.created_at,
    })
}

/// Get current session.
///
/// GET /auth/session
pub async fn get_session(auth_user: AuthUser) -> Json<SessionInfo> {
    Json(SessionInfo {
        session_id: auth_user.session_id,
        user_id: auth_user.id,
        expires_at: auth_user.session_expires_at,
    })
}
