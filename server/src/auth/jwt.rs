//! JWT Token Generation and Validation
//!
//! HS256 access tokens bound to a server-side session. A token is only
//! accepted while its session row exists, so signing out revokes it.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{AuthError, AuthResult};

/// JWT claims for access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID as UUID string).
    pub sub: String,
    /// Session ID.
    pub sid: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> AuthResult<Uuid> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    pub fn session_id(&self) -> AuthResult<Uuid> {
        self.sid.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Generate an access token for a session.
pub fn generate_access_token(
    user_id: Uuid,
    session_id: Uuid,
    expires_at: DateTime<Utc>,
    secret: &str,
) -> AuthResult<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        sid: session_id.to_string(),
        iat: Utc::now().timestamp(),
        exp: expires_at.timestamp(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Validate and decode an access token.
pub fn validate_access_token(token: &str, secret: &str) -> AuthResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_round_trip() {
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let token =
            generate_access_token(user_id, session_id, Utc::now() + Duration::hours(1), "secret")
                .unwrap();

        let claims = validate_access_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.session_id().unwrap(), session_id);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_access_token(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now() + Duration::hours(1),
            "secret",
        )
        .unwrap();

        assert!(matches!(
            validate_access_token(&token, "other"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = generate_access_token(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now() - Duration::minutes(5),
            "secret",
        )
        .unwrap();

        assert!(matches!(
            validate_access_token(&token, "secret"),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(validate_access_token("not-a-token", "secret").is_err());
    }
}
