//! Input validation.
//!
//! Structural and XSS-signature checks on raw input, run before rate
//! limiting and sanitization. Checks run in a fixed order and
//! short-circuit on the first failure:
//!
//! 1. Type check: raw bytes must be valid UTF-8 ([`validate_utf8`]).
//! 2. Length check against the configured maximum.
//! 3. Emptiness check (no trimming at this stage).
//! 4. Case-insensitive match against the unsafe-pattern list.
//!
//! Both functions are pure: no side effects, output depends only on the
//! input and the configuration.

use crate::config::ChatConfig;
use crate::error::ValidationError;

/// Unsafe substring patterns, checked case-insensitively in order.
///
/// The first match wins and is reported in the error.
pub const UNSAFE_PATTERNS: [&str; 10] = [
    "javascript:",
    "vbscript:",
    "onload=",
    "onerror=",
    "onclick=",
    "onmouseover=",
    "<script",
    "<iframe",
    "<object",
    "<embed",
];

/// Check that raw input is textual.
///
/// This is the type check of the pipeline, applied at boundaries that
/// receive bytes rather than strings. Input that is already `&str` has
/// passed it by construction.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidType`] if the bytes are not valid
/// UTF-8.
pub fn validate_utf8(raw: &[u8]) -> Result<&str, ValidationError> {
    std::str::from_utf8(raw).map_err(|_| ValidationError::InvalidType)
}

/// Validate a message against the structural and unsafe-content rules.
///
/// # Errors
///
/// Returns the first failing check:
/// - [`ValidationError::TooLong`] if the message exceeds
///   `config.max_message_len` characters
/// - [`ValidationError::Empty`] if the message is empty
/// - [`ValidationError::UnsafeContent`] if any pattern in
///   [`UNSAFE_PATTERNS`] occurs in the message, in any case
pub fn validate(input: &str, config: &ChatConfig) -> Result<(), ValidationError> {
    if input.chars().count() > config.max_message_len {
        return Err(ValidationError::TooLong {
            max: config.max_message_len,
        });
    }

    if input.is_empty() {
        return Err(ValidationError::Empty);
    }

    let lowered = input.to_lowercase();
    for pattern in UNSAFE_PATTERNS {
        if lowered.contains(pattern) {
            return Err(ValidationError::UnsafeContent { pattern });
        }
    }

    Ok(())
}
