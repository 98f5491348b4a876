//! Companion Chat Engine
//!
//! A scripted chat engine: four fixed "companion" personas answer user
//! messages with canned replies selected by ordered keyword matching.
//! Every message passes through an input-safety pipeline before it reaches
//! the response selector or the display surface.
//!
//! # Features
//!
//! - Structural and XSS-signature validation of raw input
//! - Allow-list HTML sanitization with entity escaping
//! - Fixed-window rate limiting
//! - Four built-in personas with per-category response tables
//! - Cancellable typing-delay reply delivery
//!
//! # Quick Start
//!
//! ```bash
//! ./companion-chat
//! ```
//!
//! # Architecture
//!
//! ```text
//! raw input ──▶ Validator ──▶ Rate Limiter ──▶ Sanitizer ──▶ history
//!                  │               │                            │
//!                (reject)        (reject)                       ▼
//!                                                      Response Selector
//!                                                               │
//!                                              sanitize ◀───────┘
//!                                                  │
//!                                                  ▼
//!                                            Display Sink
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod error;
pub mod persona;
pub mod responder;
pub mod security;
pub mod session;
pub mod traits;
