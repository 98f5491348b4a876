//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading
//! - Configuration validation
//! - Default value handling
//!
//! The configuration is set once at process start and never mutated.
//!
//! # Example
//!
//! ```
//! use companion_chat::config::ChatConfig;
//!
//! let config = ChatConfig::default();
//! assert_eq!(config.max_message_len, 1000);
//! assert_eq!(config.allowed_tags, vec!["br", "strong", "em", "p"]);
//! ```

mod validation;

pub use validation::{
    validate_config, MAX_HISTORY_CAPACITY, MAX_MESSAGES_LIMIT, MAX_MESSAGE_LEN_LIMIT,
    MAX_TYPING_DELAY_MS, MAX_WINDOW_SECS, MIN_WINDOW_SECS,
};

use crate::error::ConfigError;

/// Default maximum message length in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1000;

/// Default maximum messages accepted per rate-limit window.
pub const DEFAULT_MAX_MESSAGES_PER_WINDOW: u32 = 20;

/// Default rate-limit window in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Default HTML tag allow-list.
pub const DEFAULT_ALLOWED_TAGS: [&str; 4] = ["br", "strong", "em", "p"];

/// Default minimum typing delay before a reply is delivered, in milliseconds.
pub const DEFAULT_TYPING_DELAY_MIN_MS: u64 = 1500;

/// Default maximum typing delay before a reply is delivered, in milliseconds.
pub const DEFAULT_TYPING_DELAY_MAX_MS: u64 = 3500;

/// Default message history capacity.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Engine configuration.
///
/// Holds the safety-pipeline limits and session tuning knobs. Use
/// [`ChatConfig::from_env`] to load configuration from environment
/// variables, or [`ChatConfig::default`] for the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Maximum message length in characters.
    pub max_message_len: usize,
    /// Maximum messages accepted per rate-limit window.
    pub max_messages_per_window: u32,
    /// Rate-limit window in seconds.
    pub window_secs: u64,
    /// HTML tags allowed to survive sanitization.
    pub allowed_tags: Vec<String>,
    /// Whether sanitization is enabled.
    pub sanitize_input: bool,
    /// Minimum typing delay before a reply is delivered, in milliseconds.
    pub typing_delay_min_ms: u64,
    /// Maximum typing delay before a reply is delivered, in milliseconds.
    pub typing_delay_max_ms: u64,
    /// Bounded message history capacity.
    pub history_capacity: usize,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            max_messages_per_window: DEFAULT_MAX_MESSAGES_PER_WINDOW,
            window_secs: DEFAULT_WINDOW_SECS,
            allowed_tags: DEFAULT_ALLOWED_TAGS.iter().map(ToString::to_string).collect(),
            sanitize_input: true,
            typing_delay_min_ms: DEFAULT_TYPING_DELAY_MIN_MS,
            typing_delay_max_ms: DEFAULT_TYPING_DELAY_MAX_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ChatConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables (with defaults):
    /// - `COMPANION_MAX_MESSAGE_LEN`: maximum message length (default: `1000`)
    /// - `COMPANION_MAX_MESSAGES_PER_WINDOW`: messages per window (default: `20`)
    /// - `COMPANION_WINDOW_SECS`: rate-limit window in seconds (default: `60`)
    /// - `COMPANION_ALLOWED_TAGS`: comma-separated tag allow-list (default: `br,strong,em,p`)
    /// - `COMPANION_SANITIZE_INPUT`: enable sanitization (default: `true`)
    /// - `COMPANION_TYPING_DELAY_MIN_MS`: minimum reply delay (default: `1500`)
    /// - `COMPANION_TYPING_DELAY_MAX_MS`: maximum reply delay (default: `3500`)
    /// - `COMPANION_HISTORY_CAPACITY`: history capacity (default: `50`)
    /// - `LOG_LEVEL`: logging level (default: `info`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any value fails to parse or fails
    /// validation (see [`validate_config`]).
    #[must_use = "configuration should be used"]
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let max_message_len =
            parse_env_usize("COMPANION_MAX_MESSAGE_LEN", DEFAULT_MAX_MESSAGE_LEN)?;
        let max_messages_per_window = parse_env_u32(
            "COMPANION_MAX_MESSAGES_PER_WINDOW",
            DEFAULT_MAX_MESSAGES_PER_WINDOW,
        )?;
        let window_secs = parse_env_u64("COMPANION_WINDOW_SECS", DEFAULT_WINDOW_SECS)?;

        let allowed_tags = std::env::var("COMPANION_ALLOWED_TAGS").map_or_else(
            |_| DEFAULT_ALLOWED_TAGS.iter().map(ToString::to_string).collect(),
            |val| {
                val.split(',')
                    .map(|t| t.trim().to_ascii_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect()
            },
        );

        let sanitize_input = parse_env_bool("COMPANION_SANITIZE_INPUT", true)?;

        let typing_delay_min_ms =
            parse_env_u64("COMPANION_TYPING_DELAY_MIN_MS", DEFAULT_TYPING_DELAY_MIN_MS)?;
        let typing_delay_max_ms =
            parse_env_u64("COMPANION_TYPING_DELAY_MAX_MS", DEFAULT_TYPING_DELAY_MAX_MS)?;

        let history_capacity =
            parse_env_usize("COMPANION_HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY)?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into());

        let config = Self {
            max_message_len,
            max_messages_per_window,
            window_secs,
            allowed_tags,
            sanitize_input,
            typing_delay_min_ms,
            typing_delay_max_ms,
            history_capacity,
            log_level,
        };

        validate_config(&config)?;
        Ok(config)
    }

    /// Rate-limit window as a [`chrono::Duration`].
    #[must_use]
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.window_secs).unwrap_or(i64::MAX))
    }
}

/// Parse an environment variable as usize, using a default if not set.
fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as u64, using a default if not set.
fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as u32, using a default if not set.
fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as bool, using a default if not set.
///
/// Accepts `true`/`false`/`1`/`0` in any case.
fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        match val.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var: name.into(),
                reason: "must be true, false, 1, or 0".into(),
            }),
        }
    })
}
