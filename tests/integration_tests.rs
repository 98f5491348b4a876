//! Integration tests for the companion chat engine.
//!
//! These tests verify end-to-end workflows including:
//! - Session lifecycle
//! - The full safety pipeline from raw input to rendered output
//! - Rate-limit window recovery
//! - Persona pack loading

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::field_reassign_with_default
)]

use std::io::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use companion_chat::config::ChatConfig;
use companion_chat::engine::ChatEngine;
use companion_chat::error::{ChatError, RateLimitError, SessionError, ValidationError};
use companion_chat::persona::{Persona, PersonaStore, Personality, ResponseTable};
use companion_chat::session::{Message, Sender};
use companion_chat::traits::{DisplaySink, TimeProvider};

// ============================================================================
// Test Utilities
// ============================================================================

/// Sink that records rendered messages.
#[derive(Clone, Default)]
struct CollectingSink {
    rendered: Arc<Mutex<Vec<Message>>>,
}

impl CollectingSink {
    fn rendered(&self) -> Vec<Message> {
        self.rendered.lock().expect("sink lock").clone()
    }
}

#[async_trait]
impl DisplaySink for CollectingSink {
    async fn render(&self, message: &Message) {
        self.rendered.lock().expect("sink lock").push(message.clone());
    }

    async fn typing_started(&self) {}

    async fn typing_finished(&self) {}
}

/// Manually advanced clock shared between test and engine.
#[derive(Clone)]
struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    fn starting_at(rfc3339: &str) -> Self {
        let now = DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid timestamp")
            .with_timezone(&Utc);
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    fn advance_secs(&self, secs: i64) {
        let mut guard = self.now.lock().expect("clock lock");
        *guard += chrono::Duration::seconds(secs);
    }
}

impl TimeProvider for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Config with an instant typing delay so replies land deterministically.
fn fast_config() -> ChatConfig {
    let mut config = ChatConfig::default();
    config.typing_delay_min_ms = 5;
    config.typing_delay_max_ms = 5;
    config
}

fn create_engine(
    config: ChatConfig,
) -> (ChatEngine<ManualClock, CollectingSink>, ManualClock, CollectingSink) {
    let clock = ManualClock::starting_at("2025-06-01T10:00:00Z");
    let sink = CollectingSink::default();
    let store = PersonaStore::builtin().expect("builtin personas are valid");
    let engine = ChatEngine::new(config, store, clock.clone(), sink.clone());
    (engine, clock, sink)
}

// ============================================================================
// Conversation Workflow Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_full_conversation_workflow() {
    let (engine, _clock, sink) = create_engine(fast_config());
    let store = PersonaStore::builtin().expect("valid");
    let sarah = store.get("sarah").expect("sarah exists");

    let info = engine.open("sarah").await.expect("open");
    assert_eq!(info.persona_id, "sarah");

    engine.send("I've been feeling sad lately").await.expect("send");
    tokio::time::sleep(Duration::from_secs(1)).await;

    let history = engine.history().await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].sender, Sender::Companion); // greeting
    assert_eq!(history[1].sender, Sender::User);
    assert_eq!(history[2].sender, Sender::Companion);
    assert!(history[2].text.starts_with("I&#x27;m so sorry you&#x27;re feeling sad"));
    assert!(sarah.responses.sad.starts_with("I'm so sorry"));

    // Rendered output mirrors history exactly
    let rendered = sink.rendered();
    assert_eq!(rendered.len(), 3);
    assert_eq!(rendered[2].text, history[2].text);

    engine.close().await.expect("close");
    assert!(engine.history().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_each_category_selects_matching_reply() {
    let (engine, _clock, _sink) = create_engine(fast_config());
    let store = PersonaStore::builtin().expect("valid");
    let marcus = store.get("marcus").expect("marcus exists");

    for (input, expected) in [
        ("my anxiety is spiking", &marcus.responses.anxious),
        ("feeling depressed again", &marcus.responses.sad),
        ("I am so overwhelmed", &marcus.responses.stressed),
        ("tell me something", &marcus.responses.default),
    ] {
        engine.open("marcus").await.expect("open");
        engine.send(input).await.expect("send");
        tokio::time::sleep(Duration::from_secs(1)).await;

        let history = engine.history().await;
        assert_eq!(history.len(), 3, "input: {input}");
        // Compare on a stable prefix; sanitization escapes apostrophes
        let prefix: String = expected.chars().take(20).collect();
        let sanitized_prefix = prefix.replace('\'', "&#x27;");
        assert!(
            history[2].text.starts_with(&sanitized_prefix),
            "input: {input}, reply: {}",
            history[2].text
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_rejected_message_does_not_poison_session() {
    let (engine, _clock, _sink) = create_engine(fast_config());
    engine.open("luna").await.expect("open");

    let result = engine.send("javascript:alert(1)").await;
    assert!(matches!(
        result,
        Err(ChatError::Validation(ValidationError::UnsafeContent { .. }))
    ));

    // The session still works
    engine.send("hello again").await.expect("send after rejection");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(engine.history().await.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_benign_markup_sanitized_end_to_end() {
    let (engine, _clock, _sink) = create_engine(fast_config());
    engine.open("alex").await.expect("open");

    engine.send("<b>hello</b> <em>world</em>").await.expect("send");

    let history = engine.history().await;
    // <b> is stripped, <em> is allow-listed
    assert_eq!(history[1].text, "hello <em>world</em>");
}

#[tokio::test(start_paused = true)]
async fn test_history_eviction_end_to_end() {
    let mut config = fast_config();
    config.history_capacity = 3;
    config.max_messages_per_window = 100;
    let (engine, _clock, _sink) = create_engine(config);
    engine.open("alex").await.expect("open");

    for i in 0..5 {
        engine.send(&format!("message number {i}")).await.expect("send");
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    let history = engine.history().await;
    assert_eq!(history.len(), 3);
}

// ============================================================================
// Rate Limit Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rate_limit_window_recovery() {
    let mut config = fast_config();
    config.max_messages_per_window = 2;
    let (engine, clock, _sink) = create_engine(config);
    engine.open("sarah").await.expect("open");

    engine.send("one").await.expect("first");
    engine.send("two").await.expect("second");
    assert_eq!(
        engine.send("three").await,
        Err(ChatError::RateLimit(RateLimitError::Exceeded {
            max: 2,
            window_secs: 60,
        }))
    );

    // Still limited inside the window
    clock.advance_secs(30);
    assert!(engine.send("still blocked").await.is_err());

    // Window elapsed: counter resets
    clock.advance_secs(31);
    engine.send("free again").await.expect("after window");
}

#[tokio::test(start_paused = true)]
async fn test_new_session_gets_fresh_rate_limit() {
    let mut config = fast_config();
    config.max_messages_per_window = 1;
    let (engine, _clock, _sink) = create_engine(config);

    engine.open("sarah").await.expect("open");
    engine.send("one").await.expect("first");
    assert!(engine.send("two").await.is_err());

    engine.open("luna").await.expect("reopen");
    engine.send("fresh window").await.expect("new session counts from zero");
}

// ============================================================================
// Session Lifecycle Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_switching_personas_discards_everything() {
    let (engine, _clock, sink) = create_engine(fast_config());

    engine.open("sarah").await.expect("open sarah");
    engine.send("hello sarah").await.expect("send");

    engine.open("alex").await.expect("open alex");
    tokio::time::sleep(Duration::from_secs(2)).await;

    // Only alex's greeting in history; sarah's pending reply discarded
    let history = engine.history().await;
    assert_eq!(history.len(), 1);
    assert!(history[0].text.contains("Alex"));

    // Nothing was rendered after alex's greeting
    let rendered = sink.rendered();
    assert!(rendered.last().expect("rendered").text.contains("Alex"));
}

#[tokio::test]
async fn test_operations_require_session() {
    let (engine, _clock, _sink) = create_engine(fast_config());

    assert_eq!(
        engine.send("hello").await,
        Err(ChatError::Session(SessionError::NoActiveSession))
    );
    assert_eq!(
        engine.close().await,
        Err(ChatError::Session(SessionError::NoActiveSession))
    );
    assert!(engine.active().await.is_none());
}

#[tokio::test]
async fn test_active_reports_open_session() {
    let (engine, _clock, _sink) = create_engine(fast_config());
    engine.open("luna").await.expect("open");

    let info = engine.active().await.expect("active session");
    assert_eq!(info.persona_id, "luna");
    assert_eq!(info.theme.class, "theme-mindful");
}

// ============================================================================
// Persona Pack Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_engine_over_custom_persona_pack() {
    let persona = Persona {
        id: "nova".to_string(),
        name: "Nova".to_string(),
        title: "The Night Owl".to_string(),
        personality: Personality::Mindful,
        responses: ResponseTable {
            greeting: "Hello from Nova".to_string(),
            anxious: "nova anxious".to_string(),
            sad: "nova sad".to_string(),
            stressed: "nova stressed".to_string(),
            default: "nova default".to_string(),
        },
    };
    let json = serde_json::to_string(&vec![persona]).expect("serializes");

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(json.as_bytes()).expect("write");

    let store = PersonaStore::from_json_file(file.path()).expect("loads");
    let clock = ManualClock::starting_at("2025-06-01T10:00:00Z");
    let sink = CollectingSink::default();
    let engine = ChatEngine::new(fast_config(), store, clock, sink);

    let info = engine.open("nova").await.expect("open");
    assert_eq!(info.persona_name, "Nova");

    engine.send("feeling worried").await.expect("send");
    tokio::time::sleep(Duration::from_secs(1)).await;

    let history = engine.history().await;
    assert_eq!(history[2].text, "nova anxious");
}
