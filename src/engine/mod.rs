//! Chat engine: session lifecycle and the message pipeline.
//!
//! The engine owns the single active session and runs every message
//! through the safety pipeline in order: validate, rate limit, sanitize,
//! store, render. Companion replies are delivered by a cancellable
//! deferred task after a randomized typing delay; a reply whose session
//! is no longer active is discarded, never appended.
//!
//! All engine operations serialize on the session lock, so rate-limit
//! state and history are never observed mid-update.
//!
//! # Example
//!
//! ```no_run
//! use companion_chat::config::ChatConfig;
//! use companion_chat::engine::ChatEngine;
//! use companion_chat::persona::PersonaStore;
//! use companion_chat::traits::RealTimeProvider;
//! # use companion_chat::session::Message;
//! # use companion_chat::traits::DisplaySink;
//! # struct NullSink;
//! # #[async_trait::async_trait]
//! # impl DisplaySink for NullSink {
//! #     async fn render(&self, _message: &Message) {}
//! #     async fn typing_started(&self) {}
//! #     async fn typing_finished(&self) {}
//! # }
//!
//! # async fn demo() -> Result<(), companion_chat::error::ChatError> {
//! let store = PersonaStore::builtin()?;
//! let engine = ChatEngine::new(ChatConfig::default(), store, RealTimeProvider, NullSink);
//!
//! let info = engine.open("sarah").await?;
//! println!("chatting with {}", info.persona_name);
//! engine.send("I've been worried lately").await?;
//! engine.close().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::error::{ChatError, SessionError};
use crate::persona::{Persona, PersonaStore, ResponseCategory};
use crate::responder::respond;
use crate::security::{truncate_for_log, validate, RateLimiter, Sanitizer};
use crate::session::{theme_for, Message, MessageHistory, Sender, SessionInfo};
use crate::traits::{DisplaySink, TimeProvider};

/// The single active session.
struct ActiveSession {
    id: Uuid,
    persona: Persona,
    history: MessageHistory,
    limiter: RateLimiter,
    pending_replies: Vec<JoinHandle<()>>,
}

impl ActiveSession {
    fn abort_pending(&self) {
        for handle in &self.pending_replies {
            handle.abort();
        }
    }
}

/// Shared engine state, reachable from deferred reply tasks.
struct Inner<T, D> {
    config: ChatConfig,
    sanitizer: Sanitizer,
    store: PersonaStore,
    time: T,
    sink: D,
    state: Mutex<Option<ActiveSession>>,
}

/// Scripted chat engine.
///
/// Generic over the clock and the display surface so both can be
/// substituted in tests. Cloning is cheap; clones share the session.
pub struct ChatEngine<T, D>
where
    T: TimeProvider + 'static,
    D: DisplaySink + 'static,
{
    inner: Arc<Inner<T, D>>,
}

impl<T, D> Clone for ChatEngine<T, D>
where
    T: TimeProvider + 'static,
    D: DisplaySink + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, D> ChatEngine<T, D>
where
    T: TimeProvider + 'static,
    D: DisplaySink + 'static,
{
    /// Create an engine.
    #[must_use]
    pub fn new(config: ChatConfig, store: PersonaStore, time: T, sink: D) -> Self {
        let sanitizer = Sanitizer::new(&config);
        Self {
            inner: Arc::new(Inner {
                config,
                sanitizer,
                store,
                time,
                sink,
                state: Mutex::new(None),
            }),
        }
    }

    /// Open a session with a persona, discarding any previous session.
    ///
    /// Cancels pending replies of the previous session, clears its
    /// history, applies the persona's theme, and delivers the greeting as
    /// the first history entry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownPersona`] if the id is not in the
    /// store.
    pub async fn open(&self, persona_id: &str) -> Result<SessionInfo, ChatError> {
        let result = self.open_inner(persona_id).await;
        if let Err(e) = &result {
            tracing::warn!(error = %truncate_for_log(&e.to_string()), "error opening chat");
        }
        result
    }

    /// Open a session with a uniformly random persona.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownPersona`] if the store is empty.
    pub async fn open_random(&self) -> Result<SessionInfo, ChatError> {
        let persona_id = self
            .inner
            .store
            .random()
            .ok_or_else(|| SessionError::UnknownPersona {
                persona_id: "<random>".to_string(),
            })?
            .id
            .clone();
        self.open(&persona_id).await
    }

    /// Send a user message through the safety pipeline.
    ///
    /// Leading and trailing whitespace is trimmed before validation. On
    /// success the sanitized message enters the history and a companion
    /// reply is scheduled after a randomized typing delay.
    ///
    /// # Errors
    ///
    /// Returns the first pipeline rejection:
    /// [`ValidationError`](crate::error::ValidationError),
    /// [`RateLimitError`](crate::error::RateLimitError), or
    /// [`SessionError::NoActiveSession`]. Rejected input never reaches
    /// the history.
    pub async fn send(&self, input: &str) -> Result<(), ChatError> {
        let result = self.send_inner(input).await;
        if let Err(e) = &result {
            tracing::warn!(error = %truncate_for_log(&e.to_string()), "error sending message");
        }
        result
    }

    /// Close the active session, discarding history and pending replies.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveSession`] if no session is open.
    pub async fn close(&self) -> Result<(), ChatError> {
        let mut guard = self.inner.state.lock().await;
        match guard.take() {
            Some(session) => {
                session.abort_pending();
                tracing::info!(session_id = %session.id, "chat closed");
                Ok(())
            }
            None => Err(SessionError::NoActiveSession.into()),
        }
    }

    /// Snapshot the active session's history, oldest-first.
    ///
    /// Empty when no session is open.
    pub async fn history(&self) -> Vec<Message> {
        let guard = self.inner.state.lock().await;
        guard.as_ref().map_or_else(Vec::new, |s| s.history.to_vec())
    }

    /// Describe the active session, if any.
    pub async fn active(&self) -> Option<SessionInfo> {
        let guard = self.inner.state.lock().await;
        guard.as_ref().map(|s| session_info(s.id, &s.persona))
    }

    async fn open_inner(&self, persona_id: &str) -> Result<SessionInfo, ChatError> {
        let persona = self
            .inner
            .store
            .get(persona_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownPersona {
                persona_id: persona_id.to_string(),
            })?;

        let mut guard = self.inner.state.lock().await;
        if let Some(previous) = guard.take() {
            previous.abort_pending();
            tracing::debug!(session_id = %previous.id, "previous session discarded");
        }

        let now = self.inner.time.now();
        let mut session = ActiveSession {
            id: Uuid::new_v4(),
            history: MessageHistory::new(self.inner.config.history_capacity),
            limiter: RateLimiter::new(&self.inner.config, now),
            pending_replies: Vec::new(),
            persona,
        };

        let greeting = session.persona.responses.get(ResponseCategory::Greeting);
        let message = self.make_message(greeting, Sender::Companion);
        session.history.push(message.clone());

        let info = session_info(session.id, &session.persona);
        tracing::info!(persona_id = %session.persona.id, session_id = %session.id, "chat opened");
        *guard = Some(session);
        self.inner.sink.render(&message).await;

        Ok(info)
    }

    async fn send_inner(&self, input: &str) -> Result<(), ChatError> {
        let text = input.trim();
        validate(text, &self.inner.config)?;

        let mut guard = self.inner.state.lock().await;
        let session = guard.as_mut().ok_or(SessionError::NoActiveSession)?;

        session.limiter.check(self.inner.time.now())?;

        let message = self.make_message(text, Sender::User);
        session.history.push(message.clone());
        self.inner.sink.render(&message).await;

        // Pick the reply now; delivery happens after the typing delay
        // and only if the session is still the active one.
        let reply = respond(&session.persona, &message.text).to_string();
        let session_id = session.id;
        let delay = self.reply_delay();
        let inner = Arc::clone(&self.inner);

        session.pending_replies.retain(|h| !h.is_finished());
        session.pending_replies.push(tokio::spawn(async move {
            inner.sink.typing_started().await;
            tokio::time::sleep(delay).await;
            deliver_reply(&inner, session_id, &reply).await;
        }));

        tracing::debug!(session_id = %session_id, "message accepted");
        Ok(())
    }

    fn make_message(&self, text: &str, sender: Sender) -> Message {
        Message::new(
            self.inner.sanitizer.sanitize(text),
            sender,
            self.inner.time.now(),
        )
    }

    fn reply_delay(&self) -> Duration {
        let min = self.inner.config.typing_delay_min_ms;
        let max = self.inner.config.typing_delay_max_ms;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Deliver a scheduled reply, unless its session is gone.
async fn deliver_reply<T, D>(inner: &Inner<T, D>, session_id: Uuid, reply: &str)
where
    T: TimeProvider,
    D: DisplaySink,
{
    let mut guard = inner.state.lock().await;
    match guard.as_mut() {
        Some(session) if session.id == session_id => {
            let message = Message::new(
                inner.sanitizer.sanitize(reply),
                Sender::Companion,
                inner.time.now(),
            );
            session.history.push(message.clone());
            inner.sink.typing_finished().await;
            inner.sink.render(&message).await;
        }
        _ => {
            tracing::debug!(%session_id, "discarding reply for inactive session");
        }
    }
}

fn session_info(session_id: Uuid, persona: &Persona) -> SessionInfo {
    SessionInfo {
        session_id,
        persona_id: persona.id.clone(),
        persona_name: persona.name.clone(),
        persona_title: persona.title.clone(),
        theme: theme_for(persona.personality),
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
    use crate::error::{RateLimitError, ValidationError};
    use crate::traits::RealTimeProvider;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Sink that records every rendered message.
    #[derive(Default)]
    struct CollectingSink {
        rendered: StdMutex<Vec<Message>>,
        typing_events: StdMutex<Vec<&'static str>>,
    }

    impl CollectingSink {
        fn rendered(&self) -> Vec<Message> {
            self.rendered.lock().expect("sink lock").clone()
        }
    }

    #[async_trait]
    impl DisplaySink for Arc<CollectingSink> {
        async fn render(&self, message: &Message) {
            self.rendered.lock().expect("sink lock").push(message.clone());
        }

        async fn typing_started(&self) {
            self.typing_events.lock().expect("sink lock").push("started");
        }

        async fn typing_finished(&self) {
            self.typing_events.lock().expect("sink lock").push("finished");
        }
    }

    fn engine_with(
        config: ChatConfig,
    ) -> (
        ChatEngine<RealTimeProvider, Arc<CollectingSink>>,
        Arc<CollectingSink>,
    ) {
        let sink = Arc::new(CollectingSink::default());
        let store = PersonaStore::builtin().expect("builtin personas are valid");
        let engine = ChatEngine::new(config, store, RealTimeProvider, Arc::clone(&sink));
        (engine, sink)
    }

    fn engine() -> (
        ChatEngine<RealTimeProvider, Arc<CollectingSink>>,
        Arc<CollectingSink>,
    ) {
        engine_with(ChatConfig::default())
    }

    /// Config with short, deterministic typing delays for paused-time tests.
    fn fast_config() -> ChatConfig {
        let mut config = ChatConfig::default();
        config.typing_delay_min_ms = 10;
        config.typing_delay_max_ms = 10;
        config
    }

    #[tokio::test]
    async fn test_open_unknown_persona() {
        let (engine, _sink) = engine();
        let result = engine.open("zelda").await;
        assert_eq!(
            result.err(),
            Some(ChatError::Session(SessionError::UnknownPersona {
                persona_id: "zelda".to_string(),
            }))
        );
        assert!(engine.active().await.is_none());
    }

    #[tokio::test]
    async fn test_open_delivers_greeting_as_first_message() {
        let (engine, sink) = engine();
        let info = engine.open("sarah").await.expect("open");

        assert_eq!(info.persona_name, "Sarah");
        assert_eq!(info.persona_title, "The Empathetic Listener");
        assert_eq!(info.theme.class, "theme-empathetic");

        let history = engine.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sender, Sender::Companion);
        assert!(history[0].text.starts_with("Hello! I&#x27;m Sarah"));
        assert_eq!(sink.rendered().len(), 1);
    }

    #[tokio::test]
    async fn test_send_without_session() {
        let (engine, _sink) = engine();
        let result = engine.send("hello").await;
        assert_eq!(
            result,
            Err(ChatError::Session(SessionError::NoActiveSession))
        );
    }

    #[tokio::test]
    async fn test_close_without_session() {
        let (engine, _sink) = engine();
        assert_eq!(
            engine.close().await,
            Err(ChatError::Session(SessionError::NoActiveSession))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_appends_user_message_and_schedules_reply() {
        let (engine, sink) = engine_with(fast_config());
        engine.open("alex").await.expect("open");

        engine.send("  I'm worried about my project  ").await.expect("send");

        let history = engine.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].sender, Sender::User);
        // Trimmed, then sanitized (apostrophe escaped)
        assert_eq!(history[1].text, "I&#x27;m worried about my project");

        // Let the typing delay elapse
        tokio::time::sleep(Duration::from_secs(1)).await;

        let history = engine.history().await;
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].sender, Sender::Companion);
        let store = PersonaStore::builtin().expect("valid");
        let expected = Sanitizer::new(&ChatConfig::default())
            .sanitize(&store.get("alex").expect("alex").responses.anxious);
        assert_eq!(history[2].text, expected);
        assert_eq!(sink.rendered().len(), 3);
    }

    #[tokio::test]
    async fn test_send_rejects_unsafe_content() {
        let (engine, sink) = engine();
        engine.open("luna").await.expect("open");

        let result = engine.send("<script>alert(1)</script>").await;
        assert_eq!(
            result,
            Err(ChatError::Validation(ValidationError::UnsafeContent {
                pattern: "<script",
            }))
        );

        // Greeting only; rejected input never reaches history or sink
        assert_eq!(engine.history().await.len(), 1);
        assert_eq!(sink.rendered().len(), 1);
    }

    #[tokio::test]
    async fn test_send_rejects_empty_after_trim() {
        let (engine, _sink) = engine();
        engine.open("luna").await.expect("open");

        let result = engine.send("   ").await;
        assert_eq!(result, Err(ChatError::Validation(ValidationError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_enforced_per_session() {
        let mut config = fast_config();
        config.max_messages_per_window = 2;
        let (engine, _sink) = engine_with(config);
        engine.open("marcus").await.expect("open");

        engine.send("one").await.expect("first");
        engine.send("two").await.expect("second");
        let result = engine.send("three").await;
        assert_eq!(
            result,
            Err(ChatError::RateLimit(RateLimitError::Exceeded {
                max: 2,
                window_secs: 60,
            }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_new_session_discards_history() {
        let (engine, _sink) = engine_with(fast_config());
        engine.open("sarah").await.expect("open");
        engine.send("hello there").await.expect("send");
        assert_eq!(engine.history().await.len(), 2);

        let info = engine.open("marcus").await.expect("reopen");
        assert_eq!(info.persona_id, "marcus");

        let history = engine.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sender, Sender::Companion);
        assert!(history[0].text.contains("Marcus"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_reply_not_delivered_after_close() {
        let (engine, sink) = engine_with(fast_config());
        engine.open("sarah").await.expect("open");
        engine.send("hello there").await.expect("send");

        engine.close().await.expect("close");
        let rendered_at_close = sink.rendered().len();

        tokio::time::sleep(Duration::from_secs(1)).await;

        // No companion reply was rendered after close
        assert_eq!(sink.rendered().len(), rendered_at_close);
        assert!(engine.history().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_reply_not_delivered_into_new_session() {
        let (engine, _sink) = engine_with(fast_config());
        engine.open("sarah").await.expect("open");
        engine.send("hello there").await.expect("send");

        engine.open("luna").await.expect("reopen");
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Only luna's greeting; sarah's pending reply was discarded
        let history = engine.history().await;
        assert_eq!(history.len(), 1);
        assert!(history[0].text.contains("Luna"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_random_uses_store_persona() {
        let (engine, _sink) = engine_with(fast_config());
        let info = engine.open_random().await.expect("open random");
        let store = PersonaStore::builtin().expect("valid");
        assert!(store.get(&info.persona_id).is_some());
    }

    #[tokio::test]
    async fn test_open_random_on_empty_store() {
        let sink = Arc::new(CollectingSink::default());
        let store = PersonaStore::from_personas(vec![]).expect("empty store");
        let engine = ChatEngine::new(
            ChatConfig::default(),
            store,
            RealTimeProvider,
            Arc::clone(&sink),
        );
        assert!(engine.open_random().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_events_surround_reply() {
        let (engine, sink) = engine_with(fast_config());
        engine.open("alex").await.expect("open");
        engine.send("hello").await.expect("send");

        tokio::time::sleep(Duration::from_secs(1)).await;

        let events = sink.typing_events.lock().expect("sink lock").clone();
        assert_eq!(events, vec!["started", "finished"]);
    }
}
