//! Attempt store abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ratelimit::{AttemptDecision, AttemptPolicy, AttemptRecord, RateLimitError};

/// Storage for attempt records.
///
/// `check_and_record` must be atomic per key: concurrent calls for the same
/// key never lose an increment and never allow more than
/// `policy.max_attempts` attempts inside one window.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Apply [`evaluate`](crate::ratelimit::evaluate) to the record at `key`.
    async fn check_and_record(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: &AttemptPolicy,
    ) -> Result<AttemptDecision, RateLimitError>;

    /// Current record, expired or not.
    async fn get(&self, key: &str) -> Result<Option<AttemptRecord>, RateLimitError>;

    /// Remove the record at `key`.
    async fn reset(&self, key: &str) -> Result<(), RateLimitError>;

    /// Remove records whose window has elapsed. Returns how many were removed.
    async fn sweep(&self, now: DateTime<Utc>, policy: &AttemptPolicy)
        -> Result<usize, RateLimitError>;
}
