//! Trait definitions for mockable dependencies.
//!
//! This module defines traits for:
//! - [`TimeProvider`]: Time abstraction for testing
//! - [`DisplaySink`]: Display surface abstraction
//!
//! # Mocking
//!
//! All traits are annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates mock implementations automatically for testing.
//!
//! # Example
//!
//! ```
//! use companion_chat::traits::{RealTimeProvider, TimeProvider};
//!
//! let time_provider = RealTimeProvider;
//! let now = time_provider.now();
//! println!("Current time: {now}");
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::session::Message;

/// Time abstraction for testing.
///
/// Production code uses [`RealTimeProvider`]; tests inject a mock so
/// rate-limit windows and timestamps are deterministic.
#[cfg_attr(test, mockall::automock)]
pub trait TimeProvider: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production time provider backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Write-only display surface.
///
/// The engine pushes sanitized messages and typing-state changes to the
/// sink; it never reads anything back. The binary provides a console
/// implementation, tests provide collecting fakes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DisplaySink: Send + Sync {
    /// Render a message that has passed the safety pipeline.
    async fn render(&self, message: &Message);

    /// The companion started "typing" (a reply is pending).
    async fn typing_started(&self);

    /// The companion stopped "typing" (reply delivered or discarded).
    async fn typing_finished(&self);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_real_time_provider_advances() {
        let provider = RealTimeProvider;
        let a = provider.now();
        let b = provider.now();
        assert!(b >= a);
    }

    #[test]
    fn test_mock_time_provider() {
        let mut mock = MockTimeProvider::new();
        let fixed = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        mock.expect_now().return_const(fixed);

        assert_eq!(mock.now(), fixed);
        assert_eq!(mock.now(), fixed);
    }

    #[test]
    fn test_mock_display_sink_typing_events() {
        let mut mock = MockDisplaySink::new();
        mock.expect_typing_started().times(1).return_const(());
        mock.expect_typing_finished().times(1).return_const(());

        tokio_test::block_on(async {
            mock.typing_started().await;
            mock.typing_finished().await;
        });
    }
}
