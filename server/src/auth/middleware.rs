//! Authentication Middleware

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::AppState;
use crate::db::{with_timeout, User};

use super::error::AuthError;
use super::jwt::validate_access_token;

/// Authenticated user injected into request extensions.
///
/// This is a minimal struct containing only safe-to-expose user data plus
/// the session the request was made with.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Normalized email.
    pub email: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Session the token belongs to.
    pub session_id: Uuid,
    /// When that session expires.
    pub session_expires_at: DateTime<Utc>,
}

impl AuthUser {
    fn new(user: User, session_id: Uuid, session_expires_at: DateTime<Utc>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            session_id,
            session_expires_at,
        }
    }
}

/// Resolve a bearer token to its user.
///
/// The token must verify, its session must exist and be unexpired, and the
/// session must belong to the token's subject.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    let claims = validate_access_token(token, &state.config.jwt_secret)?;
    let user_id = claims.user_id()?;
    let session_id = claims.session_id()?;

    let timeout = state.config.backend_timeout();
    let session = with_timeout(timeout, state.users.find_session(session_id))
        .await?
        .filter(|s| s.user_id == user_id)
        .ok_or(AuthError::InvalidToken)?;

    let user = with_timeout(timeout, state.users.find_user_by_id(user_id))
        .await?
        .ok_or(AuthError::InvalidToken)?;

    Ok(AuthUser::new(user, session.id, session.expires_at))
}

/// Middleware to require authentication.
///
/// Extracts Bearer token from Authorization header, validates JWT and its
/// session, loads the user, and injects `AuthUser` into request extensions.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/protected", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, require_auth))
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_user = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Middleware for routes open to anonymous callers.
///
/// Without an Authorization header the request continues anonymously. A
/// header that is present but invalid is still rejected.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if request.headers().contains_key(AUTHORIZATION) {
        let auth_user = authenticate(&state, request.headers()).await?;
        request.extensions_mut().insert(auth_user);
    }
    Ok(next.run(request).await)
}

/// Extractor for authenticated user in handlers.
///
/// ```ignore
/// async fn protected_handler(auth_user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", auth_user.name)
/// }
/// ```
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Caller identity on routes behind [`optional_auth`]. `None` for anonymous
/// requests.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthUser>().cloned()))
    }
}
