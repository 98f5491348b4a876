//! Configuration validation.
//!
//! This module provides validation logic for configuration values,
//! ensuring they are within acceptable ranges.

use super::ChatConfig;
use crate::error::ConfigError;

/// Maximum allowed message length.
pub const MAX_MESSAGE_LEN_LIMIT: usize = 100_000;

/// Maximum allowed messages per window.
pub const MAX_MESSAGES_LIMIT: u32 = 1_000;

/// Minimum allowed rate-limit window in seconds.
pub const MIN_WINDOW_SECS: u64 = 1;

/// Maximum allowed rate-limit window in seconds (1 hour).
pub const MAX_WINDOW_SECS: u64 = 3_600;

/// Maximum allowed typing delay in milliseconds (30 seconds).
pub const MAX_TYPING_DELAY_MS: u64 = 30_000;

/// Maximum allowed history capacity.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if any value is out of range:
/// - `COMPANION_MAX_MESSAGE_LEN` must be between 1 and 100000
/// - `COMPANION_MAX_MESSAGES_PER_WINDOW` must be between 1 and 1000
/// - `COMPANION_WINDOW_SECS` must be between 1 and 3600
/// - `COMPANION_TYPING_DELAY_MIN_MS` must not exceed the maximum delay
/// - `COMPANION_TYPING_DELAY_MAX_MS` must be at most 30000
/// - `COMPANION_HISTORY_CAPACITY` must be between 1 and 10000
/// - `COMPANION_ALLOWED_TAGS` entries must be ASCII-alphabetic tag names
#[must_use = "validation result should be checked"]
pub fn validate_config(config: &ChatConfig) -> Result<(), ConfigError> {
    if config.max_message_len == 0 || config.max_message_len > MAX_MESSAGE_LEN_LIMIT {
        return Err(ConfigError::InvalidValue {
            var: "COMPANION_MAX_MESSAGE_LEN".into(),
            reason: format!("must be between 1 and {MAX_MESSAGE_LEN_LIMIT}"),
        });
    }

    if config.max_messages_per_window == 0 || config.max_messages_per_window > MAX_MESSAGES_LIMIT {
        return Err(ConfigError::InvalidValue {
            var: "COMPANION_MAX_MESSAGES_PER_WINDOW".into(),
            reason: format!("must be between 1 and {MAX_MESSAGES_LIMIT}"),
        });
    }

    if config.window_secs < MIN_WINDOW_SECS || config.window_secs > MAX_WINDOW_SECS {
        return Err(ConfigError::InvalidValue {
            var: "COMPANION_WINDOW_SECS".into(),
            reason: format!("must be between {MIN_WINDOW_SECS} and {MAX_WINDOW_SECS} seconds"),
        });
    }

    if config.typing_delay_min_ms > config.typing_delay_max_ms {
        return Err(ConfigError::InvalidValue {
            var: "COMPANION_TYPING_DELAY_MIN_MS".into(),
            reason: "must not exceed COMPANION_TYPING_DELAY_MAX_MS".into(),
        });
    }

    if config.typing_delay_max_ms > MAX_TYPING_DELAY_MS {
        return Err(ConfigError::InvalidValue {
            var: "COMPANION_TYPING_DELAY_MAX_MS".into(),
            reason: format!("must be at most {MAX_TYPING_DELAY_MS} ms"),
        });
    }

    if config.history_capacity == 0 || config.history_capacity > MAX_HISTORY_CAPACITY {
        return Err(ConfigError::InvalidValue {
            var: "COMPANION_HISTORY_CAPACITY".into(),
            reason: format!("must be between 1 and {MAX_HISTORY_CAPACITY}"),
        });
    }

    for tag in &config.allowed_tags {
        if tag.is_empty() || !tag.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidValue {
                var: "COMPANION_ALLOWED_TAGS".into(),
                reason: format!("invalid tag name: {tag:?}"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::field_reassign_with_default
)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = ChatConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_max_message_len() {
        let mut config = ChatConfig::default();
        config.max_message_len = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { var, .. } if var == "COMPANION_MAX_MESSAGE_LEN")
        );
    }

    #[test]
    fn test_max_message_len_too_high() {
        let mut config = ChatConfig::default();
        config.max_message_len = MAX_MESSAGE_LEN_LIMIT + 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_messages_per_window() {
        let mut config = ChatConfig::default();
        config.max_messages_per_window = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var, .. } if var == "COMPANION_MAX_MESSAGES_PER_WINDOW"
        ));
    }

    #[test]
    fn test_window_too_long() {
        let mut config = ChatConfig::default();
        config.window_secs = MAX_WINDOW_SECS + 1;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { var, .. } if var == "COMPANION_WINDOW_SECS")
        );
    }

    #[test]
    fn test_delay_min_above_max() {
        let mut config = ChatConfig::default();
        config.typing_delay_min_ms = 5000;
        config.typing_delay_max_ms = 1000;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var, .. } if var == "COMPANION_TYPING_DELAY_MIN_MS"
        ));
    }

    #[test]
    fn test_delay_max_too_high() {
        let mut config = ChatConfig::default();
        config.typing_delay_max_ms = MAX_TYPING_DELAY_MS + 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_history_capacity() {
        let mut config = ChatConfig::default();
        config.history_capacity = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var, .. } if var == "COMPANION_HISTORY_CAPACITY"
        ));
    }

    #[test]
    fn test_invalid_tag_name() {
        let mut config = ChatConfig::default();
        config.allowed_tags.push("scr ipt".to_string());
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { var, .. } if var == "COMPANION_ALLOWED_TAGS")
        );
    }

    #[test]
    fn test_empty_allow_list_is_valid() {
        // An empty allow-list means every tag is stripped
        let mut config = ChatConfig::default();
        config.allowed_tags.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_boundary_window_min() {
        let mut config = ChatConfig::default();
        config.window_secs = MIN_WINDOW_SECS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_boundary_window_max() {
        let mut config = ChatConfig::default();
        config.window_secs = MAX_WINDOW_SECS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_equal_delay_bounds() {
        let mut config = ChatConfig::default();
        config.typing_delay_min_ms = 2000;
        config.typing_delay_max_ms = 2000;
        assert!(validate_config(&config).is_ok());
    }
}
