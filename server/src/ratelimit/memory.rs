//! In-process attempt store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::ratelimit::{
    evaluate, AttemptDecision, AttemptPolicy, AttemptRecord, AttemptStore, RateLimitError,
};

/// Attempt records in a concurrent map.
///
/// The entry API holds the shard lock across read-modify-write, which makes
/// each `check_and_record` atomic for its key.
#[derive(Debug, Default)]
pub struct MemoryAttemptStore {
    records: DashMap<String, AttemptRecord>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked identifiers.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn check_and_record(
        &self,
        key: &str,
        now: DateTime<Utc>,
        policy: &AttemptPolicy,
    ) -> Result<AttemptDecision, RateLimitError> {
        let decision = match self.records.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let (decision, next) = evaluate(Some(entry.get()), now, policy);
                if let Some(record) = next {
                    entry.insert(record);
                }
                decision
            }
            Entry::Vacant(entry) => {
                let (decision, next) = evaluate(None, now, policy);
                if let Some(record) = next {
                    entry.insert(record);
                }
                decision
            }
        };
        Ok(decision)
    }

    async fn get(&self, key: &str) -> Result<Option<AttemptRecord>, RateLimitError> {
        Ok(self.records.get(key).map(|r| *r))
    }

    async fn reset(&self, key: &str) -> Result<(), RateLimitError> {
        self.records.remove(key);
        Ok(())
    }

    async fn sweep(
        &self,
        now: DateTime<Utc>,
        policy: &AttemptPolicy,
    ) -> Result<usize, RateLimitError> {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now, policy));
        Ok(before.saturating_sub(self.records.len()))
    }
}
