//! Rate limiting types.
//!
//! The attempt decision is a pure function of the stored record, the
//! current time and the policy. Stores only have to apply it atomically.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Authentication flows guarded by the attempt limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptScope {
    /// Sign-in attempts, keyed by email.
    Login,
    /// Sign-up attempts, keyed by email.
    Register,
}

impl AttemptScope {
    /// Returns the string identifier for this scope (used in store keys).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
        }
    }
}

/// Longest lockout window a policy may use (one day).
pub const MAX_WINDOW_SECS: u64 = 86_400;

/// Attempt limit for one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    /// Attempts allowed inside one window.
    pub max_attempts: u32,
    /// Lockout window in seconds.
    pub window_secs: u64,
}

impl AttemptPolicy {
    /// Window as a chrono duration, capped at [`MAX_WINDOW_SECS`].
    pub fn window(&self) -> Duration {
        let secs = self.window_secs.min(MAX_WINDOW_SECS);
        Duration::try_seconds(i64::try_from(secs).unwrap_or(0)).unwrap_or(Duration::MAX)
    }
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_secs: 900,
        }
    }
}

/// Stored state for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    /// Attempts counted in the current window.
    pub attempts: u32,
    /// Time of the last counted attempt.
    pub last_attempt: DateTime<Utc>,
}

impl AttemptRecord {
    /// A record whose window has elapsed is treated as if it did not exist.
    pub fn is_expired(&self, now: DateTime<Utc>, policy: &AttemptPolicy) -> bool {
        now - self.last_attempt > policy.window()
    }
}

/// Outcome of an attempt check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptDecision {
    /// Whether the attempt may proceed.
    pub allowed: bool,
    /// Attempts left in the current window (absent when denied or disabled).
    pub remaining_attempts: Option<u32>,
    /// Seconds until the lockout ends (0 if allowed).
    pub retry_after_secs: u64,
}

impl AttemptDecision {
    /// Decision used when limiting is disabled.
    pub const fn unlimited() -> Self {
        Self {
            allowed: true,
            remaining_attempts: None,
            retry_after_secs: 0,
        }
    }
}

/// Decide an attempt and compute the record to store.
///
/// Returns `None` as the new record when the attempt is denied; a denied
/// attempt neither increments the counter nor moves the timestamp.
pub fn evaluate(
    existing: Option<&AttemptRecord>,
    now: DateTime<Utc>,
    policy: &AttemptPolicy,
) -> (AttemptDecision, Option<AttemptRecord>) {
    let live = existing.filter(|r| !r.is_expired(now, policy));

    let Some(record) = live else {
        let fresh = AttemptRecord {
            attempts: 1,
            last_attempt: now,
        };
        let decision = AttemptDecision {
            allowed: true,
            remaining_attempts: Some(policy.max_attempts.saturating_sub(1)),
            retry_after_secs: 0,
        };
        return (decision, Some(fresh));
    };

    if record.attempts >= policy.max_attempts {
        let left = policy.window() - (now - record.last_attempt);
        let decision = AttemptDecision {
            allowed: false,
            remaining_attempts: None,
            retry_after_secs: ceil_secs(left),
        };
        return (decision, None);
    }

    let attempts = record.attempts + 1;
    let decision = AttemptDecision {
        allowed: true,
        remaining_attempts: Some(policy.max_attempts - attempts),
        retry_after_secs: 0,
    };
    (
        decision,
        Some(AttemptRecord {
            attempts,
            last_attempt: now,
        }),
    )
}

/// Whole seconds, rounded up, never below one.
fn ceil_secs(duration: Duration) -> u64 {
    let millis = duration.num_milliseconds().max(0);
    u64::try_from((millis + 999) / 1000).unwrap_or(0).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AttemptPolicy {
        AttemptPolicy {
            max_attempts: 5,
            window_secs: 900,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_fresh_identifier() {
        let (decision, record) = evaluate(None, at(0), &policy());
        assert!(decision.allowed);
        assert_eq!(decision.remaining_attempts, Some(4));
        assert_eq!(record.unwrap().attempts, 1);
    }

    #[test]
    fn test_remaining_decrements_until_denied() {
        let mut record = None;
        for expected in (0..5).rev() {
            let (decision, next) = evaluate(record.as_ref(), at(1), &policy());
            assert!(decision.allowed);
            assert_eq!(decision.remaining_attempts, Some(expected));
            record = next;
        }

        let stored = record.unwrap();
        let (decision, next) = evaluate(Some(&stored), at(2), &policy());
        assert!(!decision.allowed);
        assert!(next.is_none());
        assert_eq!(stored.attempts, 5);
    }

    #[test]
    fn test_denied_reports_time_left() {
        let record = AttemptRecord {
            attempts: 5,
            last_attempt: at(0),
        };
        let (decision, _) = evaluate(Some(&record), at(300), &policy());
        assert_eq!(decision.retry_after_secs, 600);
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let record = AttemptRecord {
            attempts: 5,
            last_attempt: at(0),
        };

        // Exactly one window later the lockout still holds
        let (decision, _) = evaluate(Some(&record), at(900), &policy());
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_secs, 1);

        let (decision, next) = evaluate(Some(&record), at(901), &policy());
        assert!(decision.allowed);
        assert_eq!(decision.remaining_attempts, Some(4));
        assert_eq!(next.unwrap().attempts, 1);
    }

    #[test]
    fn test_oversized_window_is_capped() {
        let policy = AttemptPolicy {
            max_attempts: 1,
            window_secs: 10_000_000_000_000_000,
        };
        assert_eq!(policy.window(), Duration::seconds(86_400));

        let (decision, record) = evaluate(None, at(0), &policy);
        assert!(decision.allowed);

        let (decision, _) = evaluate(record.as_ref(), at(60), &policy);
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_secs, 86_340);
    }

    #[test]
    fn test_scope_names() {
        assert_eq!(AttemptScope::Login.as_str(), "login");
        assert_eq!(AttemptScope::Register.as_str(), "register");
    }
}
