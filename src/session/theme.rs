//! Per-persona presentation themes.
//!
//! Applied as a normal step of opening a session; frontends read the
//! theme from [`SessionInfo`](super::SessionInfo) and style themselves.

use crate::persona::Personality;

/// Presentation theme for a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTheme {
    /// CSS-style theme class name.
    pub class: &'static str,
    /// Avatar gradient, start and end colors.
    pub gradient: (&'static str, &'static str),
}

/// Theme for a personality.
#[must_use]
pub const fn theme_for(personality: Personality) -> ChatTheme {
    match personality {
        Personality::Empathetic => ChatTheme {
            class: "theme-empathetic",
            gradient: ("#ec4899", "#be185d"),
        },
        Personality::Motivational => ChatTheme {
            class: "theme-motivational",
            gradient: ("#f59e0b", "#d97706"),
        },
        Personality::Mindful => ChatTheme {
            class: "theme-mindful",
            gradient: ("#10b981", "#059669"),
        },
        Personality::Practical => ChatTheme {
            class: "theme-practical",
            gradient: ("#3b82f6", "#1d4ed8"),
        },
    }
}
