//! Input-safety pipeline.
//!
//! Every message passes through this module before it reaches the response
//! selector or the display surface:
//!
//! 1. [`validator`] rejects structurally invalid or unsafe-looking input.
//! 2. [`rate_limit`] gates message frequency per session.
//! 3. [`sanitizer`] strips disallowed markup and escapes what remains.
//!
//! The pipeline order matters: validation sees raw input, sanitization runs
//! only on input that already passed validation and rate limiting.

pub mod rate_limit;
pub mod sanitizer;
pub mod validator;

pub use rate_limit::RateLimiter;
pub use sanitizer::Sanitizer;
pub use validator::{validate, validate_utf8, UNSAFE_PATTERNS};

/// Maximum characters of user-derived text included in a log line.
pub const LOG_TRUNCATE_LEN: usize = 100;

/// Truncate user-derived text for logging.
///
/// Log lines never carry more than [`LOG_TRUNCATE_LEN`] characters of
/// message content. Truncation respects character boundaries.
#[must_use]
pub fn truncate_for_log(text: &str) -> &str {
    match text.char_indices().nth(LOG_TRUNCATE_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
