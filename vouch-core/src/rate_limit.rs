//! Login attempt tracking
//!
//! A single-process, in-memory rate limiter for login attempts: per-key
//! sliding windows with an escalating lockout once the attempt budget is
//! exhausted. This is a best-effort guard against credential stuffing on a
//! single node, not a security boundary: a caller that can spoof
//! addresses and omit the email field can spread its attempts across keys.
//!
//! Keys are tracked in a concurrent map. Each check is an atomic
//! read-modify-write on its own key via the map's entry API; checks on
//! different keys never contend beyond shard granularity, and the
//! garbage-collection sweep walks shards one at a time instead of freezing
//! the whole table.
//!
//! The tracker never fails: every call resolves to an allow/deny
//! [`Decision`], with denials carrying a whole-minute retry estimate.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;

use crate::{Error, error::AuthError};

/// Key used when a request carries neither an identity nor a usable
/// network address.
const FALLBACK_KEY: &str = "unknown";

/// Fraction of checks that trigger an opportunistic sweep of stale records.
const SWEEP_PROBABILITY: f64 = 0.01;

/// Limits for the attempt tracker. Injected at construction so tests can
/// run independent trackers with tightened windows.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Attempts allowed per window before lockout.
    pub max_attempts: u32,
    /// Length of the counting window.
    pub window: Duration,
    /// Additional denial period once the budget is exhausted, measured
    /// from the end of the window.
    pub lockout: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::minutes(15),
            lockout: Duration::minutes(30),
        }
    }
}

/// Per-key attempt state. `count` only grows within a window; a new
/// window starts back at 1.
#[derive(Debug, Clone)]
struct AttemptRecord {
    count: u32,
    window_reset_at: DateTime<Utc>,
}

impl AttemptRecord {
    fn fresh(now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            count: 1,
            window_reset_at: now + window,
        }
    }
}

/// Outcome of a single tracked attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied { retry_after_minutes: i64 },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Map a denial to [`AuthError::RateLimited`] for layers that speak
    /// in errors rather than decisions.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied {
                retry_after_minutes,
            } => Err(AuthError::RateLimited {
                retry_after_minutes,
            }
            .into()),
        }
    }
}

/// Tracks login attempts per key and decides whether the next one may
/// proceed.
pub struct LoginAttemptTracker {
    attempts: DashMap<String, AttemptRecord>,
    config: RateLimitConfig,
}

impl LoginAttemptTracker {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            attempts: DashMap::new(),
            config,
        }
    }

    /// Derive the bucketing key for a request: the lowercased email when
    /// the field is present and non-empty (even if it would fail email
    /// validation, since the limiter runs in front of validation), else
    /// the caller's network address, else a fixed sentinel.
    pub fn derive_key(email: Option<&str>, remote_addr: Option<&str>) -> String {
        match email {
            Some(email) if !email.is_empty() => email.to_lowercase(),
            _ => remote_addr
                .filter(|addr| !addr.is_empty())
                .unwrap_or(FALLBACK_KEY)
                .to_string(),
        }
    }

    /// Record an attempt for `key` and decide whether it may proceed.
    ///
    /// Allowed calls count against the key's window, including the call
    /// that opens a fresh window.
    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Utc::now())
    }

    /// Forget a key entirely. Called on successful authentication so an
    /// account's budget starts over.
    pub fn reset(&self, key: &str) {
        self.attempts.remove(key);
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.attempts.len()
    }

    fn check_at(&self, key: &str, now: DateTime<Utc>) -> Decision {
        let decision = match self.attempts.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();

                if record.count >= self.config.max_attempts {
                    let lockout_ends = record.window_reset_at + self.config.lockout;
                    if now < lockout_ends {
                        Decision::Denied {
                            retry_after_minutes: ceil_minutes(lockout_ends - now),
                        }
                    } else {
                        // Lockout fully served; the window is necessarily
                        // over too, so the key starts a fresh one.
                        *record = AttemptRecord::fresh(now, self.config.window);
                        Decision::Allowed
                    }
                } else if now > record.window_reset_at {
                    *record = AttemptRecord::fresh(now, self.config.window);
                    Decision::Allowed
                } else {
                    record.count += 1;
                    Decision::Allowed
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(AttemptRecord::fresh(now, self.config.window));
                Decision::Allowed
            }
        };

        if let Decision::Denied {
            retry_after_minutes,
        } = decision
        {
            tracing::debug!(key, retry_after_minutes, "login attempt denied");
        }

        // Entry guard is dropped above; the sweep must not run while a
        // shard lock for the same key is still held.
        if rand::rng().random_bool(SWEEP_PROBABILITY) {
            self.sweep_at(now);
        }

        decision
    }

    /// Drop every record whose window plus lockout has fully elapsed.
    /// Bounds memory growth without a background scheduler; a burst of
    /// unique keys can still grow the table until their windows lapse.
    fn sweep_at(&self, now: DateTime<Utc>) {
        let before = self.attempts.len();
        self.attempts
            .retain(|_, record| now <= record.window_reset_at + self.config.lockout);

        let removed = before.saturating_sub(self.attempts.len());
        if removed > 0 {
            tracing::debug!(removed, "swept stale login attempt records");
        }
    }
}

impl Default for LoginAttemptTracker {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Round a positive duration up to whole minutes.
fn ceil_minutes(remaining: Duration) -> i64 {
    (remaining.num_milliseconds() + 59_999) / 60_000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> LoginAttemptTracker {
        LoginAttemptTracker::new(RateLimitConfig::default())
    }

    #[test]
    fn test_budget_then_deny() {
        let tracker = tracker();
        let now = Utc::now();

        for attempt in 1..=5 {
            let decision = tracker.check_at("a@x.com", now);
            assert!(decision.is_allowed(), "attempt {attempt} should be allowed");
        }

        match tracker.check_at("a@x.com", now) {
            Decision::Denied {
                retry_after_minutes,
            } => {
                // Window end is 15 minutes out, lockout adds 30 more.
                assert_eq!(retry_after_minutes, 45);
            }
            Decision::Allowed => panic!("sixth attempt should be denied"),
        }
    }

    #[test]
    fn test_retry_estimate_shrinks() {
        let tracker = tracker();
        let now = Utc::now();

        for _ in 0..5 {
            tracker.check_at("a@x.com", now);
        }

        let later = now + Duration::minutes(40);
        match tracker.check_at("a@x.com", later) {
            Decision::Denied {
                retry_after_minutes,
            } => assert_eq!(retry_after_minutes, 5),
            Decision::Allowed => panic!("still inside lockout"),
        }
    }

    #[test]
    fn test_retry_estimate_rounds_up() {
        let tracker = tracker();
        let now = Utc::now();

        for _ in 0..5 {
            tracker.check_at("a@x.com", now);
        }

        // 4 minutes and 30 seconds left rounds to 5 whole minutes.
        let later = now + Duration::minutes(40) + Duration::seconds(30);
        match tracker.check_at("a@x.com", later) {
            Decision::Denied {
                retry_after_minutes,
            } => assert_eq!(retry_after_minutes, 5),
            Decision::Allowed => panic!("still inside lockout"),
        }
    }

    #[test]
    fn test_lockout_elapsed_starts_fresh_window() {
        let tracker = tracker();
        let now = Utc::now();

        for _ in 0..6 {
            tracker.check_at("a@x.com", now);
        }

        // Window (15m) + lockout (30m) fully served.
        let later = now + Duration::minutes(46);
        assert!(tracker.check_at("a@x.com", later).is_allowed());

        // The fresh window has a fresh budget: four more attempts pass,
        // the sixth overall is denied again.
        for _ in 0..4 {
            assert!(tracker.check_at("a@x.com", later).is_allowed());
        }
        assert!(!tracker.check_at("a@x.com", later).is_allowed());
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let tracker = tracker();
        let now = Utc::now();

        for _ in 0..3 {
            tracker.check_at("a@x.com", now);
        }

        // Past the window but under the limit: counting starts over.
        let later = now + Duration::minutes(16);
        for attempt in 1..=5 {
            assert!(
                tracker.check_at("a@x.com", later).is_allowed(),
                "attempt {attempt} in the new window should be allowed"
            );
        }
        assert!(!tracker.check_at("a@x.com", later).is_allowed());
    }

    #[test]
    fn test_keys_are_isolated() {
        let tracker = tracker();
        let now = Utc::now();

        for _ in 0..6 {
            tracker.check_at("a@x.com", now);
        }

        assert!(!tracker.check_at("a@x.com", now).is_allowed());
        assert!(tracker.check_at("b@x.com", now).is_allowed());
    }

    #[test]
    fn test_reset_returns_key_to_fresh() {
        let tracker = tracker();
        let now = Utc::now();

        for _ in 0..6 {
            tracker.check_at("a@x.com", now);
        }
        assert!(!tracker.check_at("a@x.com", now).is_allowed());

        tracker.reset("a@x.com");
        assert!(tracker.check_at("a@x.com", now).is_allowed());
    }

    #[test]
    fn test_derive_key_precedence() {
        assert_eq!(
            LoginAttemptTracker::derive_key(Some("A@X.com"), Some("10.0.0.1")),
            "a@x.com"
        );
        // Malformed but present still counts as provided.
        assert_eq!(
            LoginAttemptTracker::derive_key(Some("Not-An-Email"), Some("10.0.0.1")),
            "not-an-email"
        );
        // Empty falls through to the address.
        assert_eq!(
            LoginAttemptTracker::derive_key(Some(""), Some("10.0.0.1")),
            "10.0.0.1"
        );
        assert_eq!(LoginAttemptTracker::derive_key(None, Some("10.0.0.1")), "10.0.0.1");
        assert_eq!(LoginAttemptTracker::derive_key(None, Some("")), "unknown");
        assert_eq!(LoginAttemptTracker::derive_key(None, None), "unknown");
    }

    #[test]
    fn test_sweep_removes_only_fully_elapsed() {
        let tracker = tracker();
        let now = Utc::now();

        tracker.check_at("stale@x.com", now - Duration::minutes(50));
        tracker.check_at("recent@x.com", now - Duration::minutes(10));
        assert_eq!(tracker.tracked_keys(), 2);

        // stale: window ended 35m ago, lockout of 30m also over.
        tracker.sweep_at(now);
        assert_eq!(tracker.tracked_keys(), 1);
        assert!(tracker.attempts.contains_key("recent@x.com"));
    }

    #[test]
    fn test_denied_attempts_do_not_extend_lockout() {
        let tracker = tracker();
        let now = Utc::now();

        for _ in 0..6 {
            tracker.check_at("a@x.com", now);
        }

        // Hammering during the lockout must not push the estimate out.
        let mid = now + Duration::minutes(20);
        tracker.check_at("a@x.com", mid);

        let later = now + Duration::minutes(46);
        assert!(tracker.check_at("a@x.com", later).is_allowed());
    }

    #[test]
    fn test_concurrent_checks_respect_budget() {
        use std::sync::Arc;

        let tracker = Arc::new(tracker());
        let now = Utc::now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || tracker.check_at("race@x.com", now).is_allowed())
            })
            .collect();

        let allowed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&allowed| allowed)
            .count();

        assert_eq!(allowed, 5);
    }

    #[test]
    fn test_decision_into_result() {
        assert!(Decision::Allowed.into_result().is_ok());

        let err = Decision::Denied {
            retry_after_minutes: 7,
        }
        .into_result()
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Auth(AuthError::RateLimited {
                retry_after_minutes: 7
            })
        ));
    }
}
