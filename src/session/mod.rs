//! Session data: messages, bounded history, themes.
//!
//! A session holds the conversation with one persona. Messages are
//! immutable once created and only enter the history after passing the
//! safety pipeline. The history is a bounded FIFO: when full, the oldest
//! message is evicted.

mod theme;

pub use theme::{theme_for, ChatTheme};

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The human user.
    User,
    /// The active companion persona.
    Companion,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Companion => write!(f, "companion"),
        }
    }
}

/// A sanitized chat message.
///
/// Immutable once created. The `text` field is always sanitizer output;
/// raw input never reaches a `Message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sanitized message text.
    pub text: String,
    /// Message author.
    pub sender: Sender,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message from sanitized text.
    #[must_use]
    pub const fn new(text: String, sender: Sender, timestamp: DateTime<Utc>) -> Self {
        Self {
            text,
            sender,
            timestamp,
        }
    }
}

/// Bounded FIFO message history.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use companion_chat::session::{Message, MessageHistory, Sender};
///
/// let mut history = MessageHistory::new(2);
/// history.push(Message::new("a".into(), Sender::User, Utc::now()));
/// history.push(Message::new("b".into(), Sender::Companion, Utc::now()));
/// history.push(Message::new("c".into(), Sender::User, Utc::now()));
///
/// // Capacity 2: "a" was evicted
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.iter().next().map(|m| m.text.as_str()), Some("b"));
/// ```
#[derive(Debug, Clone)]
pub struct MessageHistory {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl MessageHistory {
    /// Create an empty history holding at most `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, evicting the oldest when full.
    pub fn push(&mut self, message: Message) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate messages oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Snapshot the history oldest-first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }
}

/// Public description of an open session.
///
/// Returned by the engine when a session opens so frontends can label
/// and style the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Unique session id; deferred replies are keyed by it.
    pub session_id: Uuid,
    /// Active persona id.
    pub persona_id: String,
    /// Active persona display name.
    pub persona_name: String,
    /// Active persona title.
    pub persona_title: String,
    /// Presentation theme for the persona.
    pub theme: ChatTheme,
}
