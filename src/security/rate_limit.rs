//! Fixed-window rate limiting.
//!
//! Counts accepted messages inside a window that starts when the first
//! message after an expiry arrives. When the window elapses the counter
//! resets; while it is live, messages beyond the configured maximum are
//! rejected. The window start is only rewritten on reset, so the window
//! is a true fixed window rather than sliding with every accepted
//! message.
//!
//! Time is passed in by the caller (sourced from a
//! [`TimeProvider`](crate::traits::TimeProvider)), which keeps the
//! limiter deterministic under test.

use chrono::{DateTime, Duration, Utc};

use crate::config::ChatConfig;
use crate::error::RateLimitError;

/// Fixed-window message-count gate.
///
/// Owned by a session; counter and window start always change together
/// under the session lock.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use companion_chat::config::ChatConfig;
/// use companion_chat::security::RateLimiter;
///
/// let now = Utc::now();
/// let mut limiter = RateLimiter::new(&ChatConfig::default(), now);
/// assert!(limiter.check(now).is_ok());
/// assert_eq!(limiter.count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiter {
    max_per_window: u32,
    window_secs: u64,
    window: Duration,
    count: u32,
    window_start: DateTime<Utc>,
}

impl RateLimiter {
    /// Create a limiter with an empty window starting at `now`.
    #[must_use]
    pub fn new(config: &ChatConfig, now: DateTime<Utc>) -> Self {
        Self {
            max_per_window: config.max_messages_per_window,
            window_secs: config.window_secs,
            window: config.window(),
            count: 0,
            window_start: now,
        }
    }

    /// Gate one outgoing message.
    ///
    /// Resets the window if it has elapsed, then either rejects (state
    /// untouched beyond the reset) or counts the message.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::Exceeded`] when the live window already
    /// holds the configured maximum.
    pub fn check(&mut self, now: DateTime<Utc>) -> Result<(), RateLimitError> {
        if now - self.window_start > self.window {
            self.count = 0;
            self.window_start = now;
        }

        if self.count >= self.max_per_window {
            return Err(RateLimitError::Exceeded {
                max: self.max_per_window,
                window_secs: self.window_secs,
            });
        }

        self.count += 1;
        Ok(())
    }

    /// Messages accepted in the current window.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Start of the current window.
    #[must_use]
    pub const fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::field_reassign_with_default
)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T12:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    fn limiter() -> RateLimiter {
        RateLimiter::new(&ChatConfig::default(), start())
    }

    #[test]
    fn test_first_message_accepted() {
        let mut limiter = limiter();
        assert!(limiter.check(start()).is_ok());
        assert_eq!(limiter.count(), 1);
    }

    #[test]
    fn test_twenty_first_message_rejected() {
        let mut limiter = limiter();
        let now = start();
        for _ in 0..20 {
            assert!(limiter.check(now).is_ok());
        }
        let result = limiter.check(now);
        assert_eq!(
            result,
            Err(RateLimitError::Exceeded {
                max: 20,
                window_secs: 60,
            })
        );
    }

    #[test]
    fn test_rejection_does_not_mutate_count() {
        let mut limiter = limiter();
        let now = start();
        for _ in 0..20 {
            limiter.check(now).expect("within limit");
        }
        let _ = limiter.check(now);
        let _ = limiter.check(now);
        assert_eq!(limiter.count(), 20);
    }

    #[test]
    fn test_window_expiry_resets_counter() {
        let mut limiter = limiter();
        let now = start();
        for _ in 0..20 {
            limiter.check(now).expect("within limit");
        }
        assert!(limiter.check(now).is_err());

        let later = now + Duration::seconds(61);
        assert!(limiter.check(later).is_ok());
        assert_eq!(limiter.count(), 1);
        assert_eq!(limiter.window_start(), later);
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        // Exactly window_secs later is still inside the window
        let mut limiter = limiter();
        let now = start();
        for _ in 0..20 {
            limiter.check(now).expect("within limit");
        }
        let at_boundary = now + Duration::seconds(60);
        assert!(limiter.check(at_boundary).is_err());
    }

    #[test]
    fn test_window_start_fixed_while_live() {
        // Accepted messages do not slide the window start
        let mut limiter = limiter();
        let now = start();
        limiter.check(now).expect("first");
        limiter
            .check(now + Duration::seconds(30))
            .expect("second");
        assert_eq!(limiter.window_start(), now);
    }

    #[test]
    fn test_custom_limits() {
        let mut config = ChatConfig::default();
        config.max_messages_per_window = 2;
        config.window_secs = 10;
        let mut limiter = RateLimiter::new(&config, start());

        let now = start();
        assert!(limiter.check(now).is_ok());
        assert!(limiter.check(now).is_ok());
        assert_eq!(
            limiter.check(now),
            Err(RateLimitError::Exceeded {
                max: 2,
                window_secs: 10,
            })
        );
        assert!(limiter.check(now + Duration::seconds(11)).is_ok());
    }
}
