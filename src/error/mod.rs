//! Error types for the companion chat engine.
//!
//! This module defines a hierarchical error system:
//! - [`ChatError`]: Top-level engine errors
//! - [`ValidationError`]: Input validation failures
//! - [`RateLimitError`]: Rate limiter rejections
//! - [`SessionError`]: Session lifecycle errors
//! - [`ConfigError`]: Configuration and persona-pack errors
//!
//! All errors are local, recoverable, and user-facing: callers catch them,
//! surface a transient notice, and continue. All implement `Send + Sync`
//! for async compatibility.

use thiserror::Error;

/// Top-level engine error.
///
/// This is the main error type returned by public engine operations.
/// It wraps all subsystem errors for unified error handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Message rejected by the rate limiter.
    #[error("Rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// Session lifecycle error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Input validation errors.
///
/// Checks run in a fixed order and short-circuit on the first failure:
/// type, length, emptiness, unsafe patterns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Raw input was not valid UTF-8 text.
    #[error("Invalid input type: not valid text")]
    InvalidType,

    /// Message exceeds the configured maximum length.
    #[error("Message too long: maximum {max} characters allowed")]
    TooLong {
        /// The configured maximum length.
        max: usize,
    },

    /// Message was empty.
    #[error("Message cannot be empty")]
    Empty,

    /// Input matched an unsafe markup pattern.
    #[error("Potentially unsafe content detected: {pattern}")]
    UnsafeContent {
        /// The pattern that matched.
        pattern: &'static str,
    },
}

/// Rate limiter rejections.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// Too many messages in the current window.
    #[error("Rate limit exceeded: at most {max} messages per {window_secs}s, please wait")]
    Exceeded {
        /// Maximum messages allowed per window.
        max: u32,
        /// Window length in seconds.
        window_secs: u64,
    },
}

/// Session lifecycle errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The requested persona does not exist.
    #[error("Unknown persona: {persona_id}")]
    UnknownPersona {
        /// The persona id that was not found.
        persona_id: String,
    },

    /// An operation required an active session but none was open.
    #[error("No active chat session")]
    NoActiveSession,
}

/// Configuration errors.
///
/// These represent failures in configuration loading, configuration
/// validation, and persona-pack loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// A persona failed startup validation.
    #[error("Invalid persona {persona_id}: {reason}")]
    InvalidPersona {
        /// The offending persona id.
        persona_id: String,
        /// Why the persona is invalid.
        reason: String,
    },

    /// A persona pack file could not be read or parsed.
    #[error("Persona pack {path}: {reason}")]
    PersonaPack {
        /// Path to the pack file.
        path: String,
        /// Why loading failed.
        reason: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    // Type assertions - verify all errors implement required traits
    assert_impl_all!(ChatError: Send, Sync, std::error::Error, Clone);
    assert_impl_all!(ValidationError: Send, Sync, std::error::Error, Clone);
    assert_impl_all!(RateLimitError: Send, Sync, std::error::Error, Clone);
    assert_impl_all!(SessionError: Send, Sync, std::error::Error, Clone);
    assert_impl_all!(ConfigError: Send, Sync, std::error::Error, Clone);

    // ChatError tests
    #[test]
    fn test_chat_error_display_validation() {
        let err = ChatError::Validation(ValidationError::Empty);
        assert_eq!(err.to_string(), "Validation error: Message cannot be empty");
    }

    #[test]
    fn test_chat_error_display_rate_limit() {
        let err = ChatError::RateLimit(RateLimitError::Exceeded {
            max: 20,
            window_secs: 60,
        });
        assert_eq!(
            err.to_string(),
            "Rate limit error: Rate limit exceeded: at most 20 messages per 60s, please wait"
        );
    }

    #[test]
    fn test_chat_error_display_session() {
        let err = ChatError::Session(SessionError::NoActiveSession);
        assert_eq!(err.to_string(), "Session error: No active chat session");
    }

    #[test]
    fn test_chat_error_display_config() {
        let err = ChatError::Config(ConfigError::InvalidValue {
            var: "COMPANION_MAX_MESSAGE_LEN".to_string(),
            reason: "must be a positive integer".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid value for COMPANION_MAX_MESSAGE_LEN: must be a positive integer"
        );
    }

    // From impl tests
    #[test]
    fn test_chat_error_from_validation_error() {
        let err: ChatError = ValidationError::InvalidType.into();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[test]
    fn test_chat_error_from_rate_limit_error() {
        let err: ChatError = RateLimitError::Exceeded {
            max: 20,
            window_secs: 60,
        }
        .into();
        assert!(matches!(err, ChatError::RateLimit(_)));
    }

    #[test]
    fn test_chat_error_from_session_error() {
        let err: ChatError = SessionError::NoActiveSession.into();
        assert!(matches!(err, ChatError::Session(_)));
    }

    #[test]
    fn test_chat_error_from_config_error() {
        let err: ChatError = ConfigError::InvalidValue {
            var: "TEST".to_string(),
            reason: "bad".to_string(),
        }
        .into();
        assert!(matches!(err, ChatError::Config(_)));
    }

    // ValidationError tests
    #[test]
    fn test_validation_error_display_invalid_type() {
        let err = ValidationError::InvalidType;
        assert_eq!(err.to_string(), "Invalid input type: not valid text");
    }

    #[test]
    fn test_validation_error_display_too_long() {
        let err = ValidationError::TooLong { max: 1000 };
        assert_eq!(
            err.to_string(),
            "Message too long: maximum 1000 characters allowed"
        );
    }

    #[test]
    fn test_validation_error_display_unsafe_content() {
        let err = ValidationError::UnsafeContent {
            pattern: "<script",
        };
        assert_eq!(
            err.to_string(),
            "Potentially unsafe content detected: <script"
        );
    }

    // SessionError tests
    #[test]
    fn test_session_error_display_unknown_persona() {
        let err = SessionError::UnknownPersona {
            persona_id: "zelda".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown persona: zelda");
    }

    // ConfigError tests
    #[test]
    fn test_config_error_display_invalid_persona() {
        let err = ConfigError::InvalidPersona {
            persona_id: "sarah".to_string(),
            reason: "missing greeting response".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid persona sarah: missing greeting response"
        );
    }

    #[test]
    fn test_config_error_display_persona_pack() {
        let err = ConfigError::PersonaPack {
            path: "./personas.json".to_string(),
            reason: "expected an array".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Persona pack ./personas.json: expected an array"
        );
    }

    // Clone / PartialEq tests
    #[test]
    fn test_validation_error_clone_eq() {
        let err = ValidationError::TooLong { max: 1000 };
        let cloned = err.clone();
        assert_eq!(err, cloned);
        assert_ne!(err, ValidationError::Empty);
    }

    #[test]
    fn test_rate_limit_error_clone_eq() {
        let err = RateLimitError::Exceeded {
            max: 20,
            window_secs: 60,
        };
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }

    #[test]
    fn test_session_error_clone_eq() {
        let err = SessionError::UnknownPersona {
            persona_id: "a".to_string(),
        };
        let cloned = err.clone();
        assert_eq!(err, cloned);
        assert_ne!(
            err,
            SessionError::UnknownPersona {
                persona_id: "b".to_string(),
            }
        );
    }
}
