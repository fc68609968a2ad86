//! Rate limiting configuration.

use crate::ratelimit::{AttemptPolicy, MAX_WINDOW_SECS};

/// Where attempt records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptBackend {
    /// Process-local concurrent map.
    Memory,
    /// Shared Redis instance (multi-instance deployments).
    Redis,
}

/// Configuration for the authentication attempt limiter.
#[derive(Debug, Clone)]
pub struct AttemptLimitConfig {
    /// Whether attempt limiting is enabled
    pub enabled: bool,
    /// Storage backend for attempt records
    pub backend: AttemptBackend,
    /// Prefix for store keys (e.g., "polls:rl")
    pub key_prefix: String,
    /// Attempts allowed per window and the window length
    pub policy: AttemptPolicy,
    /// How often expired in-memory records are swept, in seconds (0 disables)
    pub sweep_interval_secs: u64,
}

impl Default for AttemptLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: AttemptBackend::Memory,
            key_prefix: "polls:rl".to_string(),
            policy: AttemptPolicy::default(),
            sweep_interval_secs: 60,
        }
    }
}

impl AttemptLimitConfig {
    /// Creates configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RATE_LIMIT_ENABLED`: Enable/disable attempt limiting (default: true)
    /// - `RATE_LIMIT_BACKEND`: `memory` or `redis` (default: memory)
    /// - `RATE_LIMIT_PREFIX`: Store key prefix (default: "polls:rl")
    /// - `RATE_LIMIT_AUTH`: Limit as "`max_attempts,window_secs`" (default: "5,900")
    /// - `RATE_LIMIT_SWEEP_SECS`: Sweep interval for the memory backend (default: 60)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RATE_LIMIT_ENABLED") {
            config.enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_BACKEND") {
            if let Some(backend) = parse_backend(&val) {
                config.backend = backend;
            }
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_PREFIX") {
            config.key_prefix = val;
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_AUTH") {
            if let Some(policy) = parse_policy(&val) {
                config.policy = policy;
            }
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_SWEEP_SECS") {
            if let Ok(secs) = val.trim().parse() {
                config.sweep_interval_secs = secs;
            }
        }

        config
    }
}

fn parse_backend(val: &str) -> Option<AttemptBackend> {
    match val.trim().to_ascii_lowercase().as_str() {
        "memory" => Some(AttemptBackend::Memory),
        "redis" => Some(AttemptBackend::Redis),
        _ => None,
    }
}

/// Parses a policy from "`max_attempts,window_secs`" format. The window must
/// be between one second and [`MAX_WINDOW_SECS`].
fn parse_policy(val: &str) -> Option<AttemptPolicy> {
    let parts: Vec<&str> = val.split(',').collect();
    if parts.len() == 2 {
        let max_attempts = parts[0].trim().parse().ok()?;
        let window_secs = parts[1].trim().parse().ok()?;
        if max_attempts == 0 || window_secs == 0 || window_secs > MAX_WINDOW_SECS {
            return None;
        }
        Some(AttemptPolicy {
            max_attempts,
            window_secs,
        })
    } else {
        None
    }
}
