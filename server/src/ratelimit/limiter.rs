//! Authentication attempt limiter.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::ratelimit::{
    AttemptDecision, AttemptLimitConfig, AttemptRecord, AttemptScope, AttemptStore, Clock,
    MemoryAttemptStore, RateLimitError, SystemClock,
};

/// Guards sign-in and sign-up against brute force.
///
/// Identifiers are normalized (trimmed, lower-cased) and namespaced by scope,
/// so `Login` and `Register` attempts for one email are counted separately.
#[derive(Clone)]
pub struct AttemptLimiter {
    store: Arc<dyn AttemptStore>,
    clock: Arc<dyn Clock>,
    config: Arc<AttemptLimitConfig>,
}

impl AttemptLimiter {
    pub fn new(
        store: Arc<dyn AttemptStore>,
        clock: Arc<dyn Clock>,
        config: AttemptLimitConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config: Arc::new(config),
        }
    }

    /// Limiter over a process-local store and the wall clock.
    pub fn in_memory(config: AttemptLimitConfig) -> Self {
        Self::new(
            Arc::new(MemoryAttemptStore::new()),
            Arc::new(SystemClock),
            config,
        )
    }

    /// Checks the limit for an identifier and counts the attempt.
    ///
    /// # Errors
    /// Returns `RateLimitError::StoreUnavailable` if the store fails.
    #[tracing::instrument(skip(self), fields(scope = %scope.as_str()))]
    pub async fn check_and_record_attempt(
        &self,
        scope: AttemptScope,
        identifier: &str,
    ) -> Result<AttemptDecision, RateLimitError> {
        if !self.config.enabled {
            return Ok(AttemptDecision::unlimited());
        }

        let key = self.build_key(scope, identifier);
        let decision = self
            .store
            .check_and_record(&key, self.clock.now(), &self.config.policy)
            .await?;

        debug!(
            allowed = decision.allowed,
            remaining = ?decision.remaining_attempts,
            "Attempt recorded"
        );
        Ok(decision)
    }

    /// Like [`check_and_record_attempt`](Self::check_and_record_attempt), but
    /// turns a denial into [`RateLimitError::LimitExceeded`].
    pub async fn enforce(
        &self,
        scope: AttemptScope,
        identifier: &str,
    ) -> Result<AttemptDecision, RateLimitError> {
        let decision = self.check_and_record_attempt(scope, identifier).await?;
        if decision.allowed {
            Ok(decision)
        } else {
            warn!(
                scope = %scope.as_str(),
                retry_after = decision.retry_after_secs,
                "Attempt limit reached, identifier locked out"
            );
            Err(RateLimitError::LimitExceeded {
                retry_after: decision.retry_after_secs,
            })
        }
    }

    /// Forgets all attempts for an identifier. Called after a successful login
    /// or registration.
    #[tracing::instrument(skip(self), fields(scope = %scope.as_str()))]
    pub async fn reset(&self, scope: AttemptScope, identifier: &str) -> Result<(), RateLimitError> {
        if !self.config.enabled {
            return Ok(());
        }
        self.store.reset(&self.build_key(scope, identifier)).await
    }

    /// Current record for an identifier.
    pub async fn attempts(
        &self,
        scope: AttemptScope,
        identifier: &str,
    ) -> Result<Option<AttemptRecord>, RateLimitError> {
        self.store.get(&self.build_key(scope, identifier)).await
    }

    /// Removes records whose window has elapsed.
    pub async fn sweep(&self) -> Result<usize, RateLimitError> {
        self.store
            .sweep(self.clock.now(), &self.config.policy)
            .await
    }

    /// Spawns the periodic sweep task, unless disabled by configuration.
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        if !self.config.enabled || self.config.sweep_interval_secs == 0 {
            return None;
        }

        let limiter = self.clone();
        let period = Duration::from_secs(self.config.sweep_interval_secs);
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match limiter.sweep().await {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, "Swept expired attempt records"),
                    Err(e) => warn!(error = %e, "Attempt sweep failed"),
                }
            }
        }))
    }

    /// Returns the configuration for this limiter.
    pub fn config(&self) -> &AttemptLimitConfig {
        &self.config
    }

    /// Builds a store key with the configured prefix.
    fn build_key(&self, scope: AttemptScope, identifier: &str) -> String {
        format!(
            "{}:{}:{}",
            self.config.key_prefix,
            scope.as_str(),
            identifier.trim().to_lowercase()
        )
    }
}
