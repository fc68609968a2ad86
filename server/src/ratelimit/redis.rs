//! Redis-backed attempt store for multi-instance deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fred::prelude::*;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::ratelimit::{
    AttemptDecision, AttemptPolicy, AttemptRecord, AttemptStore, RateLimitError,
};

/// Embedded Lua script for atomic attempt check and increment.
const ATTEMPT_LIMIT_SCRIPT: &str = include_str!("attempt_limit.lua");

/// Value returned by the script for an allowed attempt.
const SCRIPT_ALLOWED: i64 = 1;

/// Attempt records kept in Redis hashes.
///
/// Keys expire shortly after their window, so no sweep is needed.
#[derive(Clone)]
pub struct RedisAttemptStore {
    redis: Client,
    script_sha: Arc<RwLock<String>>,
}

impl RedisAttemptStore {
    /// Creates the store and loads the Lua script into Redis.
    pub async fn connect(redis: Client) -> Result<Self, Error> {
        let store = Self {
            redis,
            script_sha: Arc::new(RwLock::new(String::new())),
        };
        store.load_script().await?;
        Ok(store)
    }

    /// Loads or reloads the Lua script.
    ///
    /// Called on connect and when NOSCRIPT errors are encountered.
    async fn load_script(&self) -> Result<(), Error> {
        let sha: String = self.redis.script_load(ATTEMPT_LIMIT_SCRIPT).await?;
        info!(sha = %sha, "Attempt limit script loaded into Redis");
        *self.script_sha.write().await = sha;
        Ok(())
    }

    /// Checks if an error is a NOSCRIPT error (script not found in Redis).
    fn is_noscript_error(error: &Error) -> bool {
        error.to_string().contains("NOSCRIPT")
    }

    /// Executes the attempt script with NOSCRIPT retry.
    async fn execute_script(&self, key: &str, args: Vec<String>) -> Result<Vec<i64>, RateLimitError> {
        let sha = self.script_sha.read().await.clone();

        let result: Result<Vec<i64>, _> = self
            .redis
            .evalsha(&sha, vec![key], args.clone())
            .await;

        match result {
            Ok(r) => Ok(r),
            Err(e) if Self::is_noscript_error(&e) => {
                warn!("NOSCRIPT error, reloading attempt limit script");
                self.load_script().await.map_err(unavailable)?;

                let new_sha = self.script_sha.read().await.clone();
                self.redis
                    .evalsha(&new_sha, vec![key], args)
                    .await
                    .map_err(unavailable)
            }
            Err(e) => Err(unavailable(e)),
        }
    }
}

fn unavailable(e: Error) -> RateLimitError {
    warn!(error = %e, "Redis attempt store call failed");
    RateLimitError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl AttemptStore for RedisAttemptStore {
    async fn check_and_record(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: &AttemptPolicy,
    ) -> Result<AttemptDecision, RateLimitError> {
        let window_ms = policy.window().num_milliseconds();
        let result = self
            .execute_script(
                key,
                vec![
                    now.timestamp_millis().to_string(),
                    window_ms.to_string(),
                    policy.max_attempts.to_string(),
                ],
            )
            .await?;

        let [allowed, attempts, retry_after_ms] = result[..] else {
            return Err(RateLimitError::StoreUnavailable(format!(
                "unexpected script reply: {result:?}"
            )));
        };

        if allowed == SCRIPT_ALLOWED {
            let attempts = u32::try_from(attempts).unwrap_or(policy.max_attempts);
            Ok(AttemptDecision {
                allowed: true,
                remaining_attempts: Some(policy.max_attempts.saturating_sub(attempts)),
                retry_after_secs: 0,
            })
        } else {
            let retry_after = u64::try_from(retry_after_ms.max(0)).unwrap_or(0);
            Ok(AttemptDecision {
                allowed: false,
                remaining_attempts: None,
                retry_after_secs: retry_after.div_ceil(1000).max(1),
            })
        }
    }

    async fn get(&self, key: &str) -> Result<Option<AttemptRecord>, RateLimitError> {
        let fields: HashMap<String, String> = self.redis.hgetall(key).await.map_err(unavailable)?;

        let attempts = fields.get("attempts").and_then(|v| v.parse().ok());
        let last = fields
            .get("last")
            .and_then(|v| v.parse().ok())
            .and_then(DateTime::from_timestamp_millis);

        Ok(match (attempts, last) {
            (Some(attempts), Some(last_attempt)) => Some(AttemptRecord {
                attempts,
                last_attempt,
            }),
            _ => None,
        })
    }

    async fn reset(&self, key: &str) -> Result<(), RateLimitError> {
        self.redis.del::<(), _>(key).await.map_err(unavailable)
    }

    async fn sweep(
        &self,
        _now: DateTime<Utc>,
        _policy: &AttemptPolicy,
    ) -> Result<usize, RateLimitError> {
        Ok(0)
    }
}
