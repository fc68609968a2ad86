//! Redis Integration Tests
//!
//! Attempt limiting against a live Redis through the Lua script.

#[cfg(test)]
mod redis_tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::config::Config;
    use crate::db::create_redis_client;
    use crate::ratelimit::{
        AttemptLimitConfig, AttemptLimiter, AttemptPolicy, AttemptScope, AttemptStore,
        ManualClock, RedisAttemptStore,
    };

    /// Helper to create a test attempt store
    async fn create_test_store() -> RedisAttemptStore {
        let client = create_redis_client(&Config::default_for_test().redis_url)
            .await
            .expect("Failed to connect to Redis");
        RedisAttemptStore::connect(client)
            .await
            .expect("Failed to load attempt script")
    }

    fn unique_key() -> String {
        format!("test:rl:{}", Uuid::new_v4())
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_script_counts_and_denies() {
        let store = create_test_store().await;
        let key = unique_key();
        let policy = AttemptPolicy {
            max_attempts: 3,
            window_secs: 60,
        };
        let now = Utc::now();

        for expected in [2, 1, 0] {
            let decision = store.check_and_record(&key, now, &policy).await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.remaining_attempts, Some(expected));
        }

        let denied = store
            .check_and_record(&key, now + Duration::seconds(10), &policy)
            .await
            .unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining_attempts, None);
        assert_eq!(denied.retry_after_secs, 50);

        // Denials are not counted
        assert_eq!(store.get(&key).await.unwrap().unwrap().attempts, 3);

        store.reset(&key).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_window_expiry_resets_count() {
        let store = create_test_store().await;
        let key = unique_key();
        let policy = AttemptPolicy {
            max_attempts: 1,
            window_secs: 60,
        };
        let now = Utc::now();

        assert!(store.check_and_record(&key, now, &policy).await.unwrap().allowed);
        assert!(!store.check_and_record(&key, now, &policy).await.unwrap().allowed);

        let later = now + Duration::seconds(61);
        let decision = store.check_and_record(&key, later, &policy).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(store.get(&key).await.unwrap().unwrap().attempts, 1);

        store.reset(&key).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_concurrent_attempts_are_not_lost() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let limiter = AttemptLimiter::new(
            Arc::new(create_test_store().await),
            clock,
            AttemptLimitConfig {
                key_prefix: unique_key(),
                ..AttemptLimitConfig::default()
            },
        );

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter
                        .check_and_record_attempt(AttemptScope::Login, "ada@example.com")
                        .await
                        .unwrap()
                        .allowed
                })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);

        limiter
            .reset(AttemptScope::Login, "ada@example.com")
            .await
            .unwrap();
    }
}
