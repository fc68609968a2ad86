//! Password hashing (Argon2id).
//!
//! Hashing is CPU heavy, so the async wrappers run it on the blocking pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::error::{AuthError, AuthResult};

/// Hash checked when the account does not exist, so an unknown email costs
/// as much as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("no-such-account-Passw0rd!").ok());

static VERIFICATIONS: AtomicU64 = AtomicU64::new(0);

/// Password verifications run by this process.
pub fn verification_count() -> u64 {
    VERIFICATIONS.load(Ordering::Relaxed)
}

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Check a password against a PHC string.
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    VERIFICATIONS.fetch_add(1, Ordering::Relaxed);
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on a blocking thread.
pub async fn hash_password_blocking(password: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("hash task failed: {e}")))?
}

/// [`verify_password`] on a blocking thread.
pub async fn verify_password_blocking(password: String, hash: String) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("verify task failed: {e}")))?
}

/// Run a verification against [`DUMMY_HASH`] on a blocking thread and
/// discard the result.
pub async fn verify_dummy_password(password: String) -> AuthResult<()> {
    tokio::task::spawn_blocking(move || {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = verify_password(&password, hash);
        }
    })
    .await
    .map_err(|e| AuthError::Internal(format!("verify task failed: {e}")))
}
