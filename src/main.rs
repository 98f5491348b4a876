//! Console chat frontend.
//!
//! Line-oriented frontend for the companion chat engine. User lines are
//! either commands (`/open`, `/random`, `/close`, `/personas`, `/quit`)
//! or messages sent through the safety pipeline. All logs go to stderr;
//! stdout is the chat surface.

use std::io::Write as _;

use async_trait::async_trait;
use tokio::io::AsyncBufReadExt;

use companion_chat::config::ChatConfig;
use companion_chat::engine::ChatEngine;
use companion_chat::persona::PersonaStore;
use companion_chat::session::Message;
use companion_chat::traits::{DisplaySink, RealTimeProvider};

/// Renders chat output to stdout.
struct ConsoleSink;

#[async_trait]
impl DisplaySink for ConsoleSink {
    async fn render(&self, message: &Message) {
        println!(
            "[{}] {}: {}",
            message.timestamp.format("%H:%M"),
            message.sender,
            message.text
        );
    }

    async fn typing_started(&self) {
        println!("  ...");
    }

    async fn typing_finished(&self) {}
}

fn print_help() {
    println!("Commands:");
    println!("  /open <id>   open a chat with a persona");
    println!("  /random      open a chat with a random persona");
    println!("  /personas    list available personas");
    println!("  /close       close the current chat");
    println!("  /quit        exit");
    println!("Anything else is sent as a message.");
}

/// Load the persona store, from `COMPANION_PERSONA_PACK` if set.
fn load_personas() -> Result<PersonaStore, companion_chat::error::ConfigError> {
    match std::env::var("COMPANION_PERSONA_PACK") {
        Ok(path) => PersonaStore::from_json_file(path),
        Err(_) => PersonaStore::builtin(),
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout is the chat surface
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string())
                .parse()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("companion-chat starting...");

    let config = match ChatConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let store = match load_personas() {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Persona error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Configuration loaded: max_len={}, rate={}per{}s, personas={}",
        config.max_message_len,
        config.max_messages_per_window,
        config.window_secs,
        store.len()
    );

    let engine = ChatEngine::new(config, store.clone(), RealTimeProvider, ConsoleSink);

    print_help();

    let mut reader = tokio::io::BufReader::new(tokio::io::stdin());
    let mut line = Vec::new();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        line.clear();
        let read = tokio::select! {
            read = reader.read_until(b'\n', &mut line) => read,
            _ = tokio::signal::ctrl_c() => break,
        };

        match read {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("stdin error: {e}");
                break;
            }
        }

        // The type check of the pipeline: reject non-textual input
        let text = match companion_chat::security::validate_utf8(&line) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                println!("! {e}");
                continue;
            }
        };

        match text.as_str() {
            "" => {}
            "/quit" => break,
            "/help" => print_help(),
            "/personas" => {
                for id in store.ids() {
                    if let Some(persona) = store.get(id) {
                        println!("  {id}: {} - {}", persona.name, persona.title);
                    }
                }
            }
            "/random" => {
                if let Err(e) = engine.open_random().await {
                    println!("! {e}");
                }
            }
            "/close" => {
                if let Err(e) = engine.close().await {
                    println!("! {e}");
                }
            }
            other => {
                if let Some(id) = other.strip_prefix("/open ") {
                    if let Err(e) = engine.open(id.trim()).await {
                        println!("! {e}");
                    }
                } else if other.starts_with('/') {
                    println!("! Unknown command: {other}");
                } else if let Err(e) = engine.send(other).await {
                    println!("! {e}");
                }
            }
        }
    }

    // Drop any pending reply before exiting
    let _ = engine.close().await;
    tracing::info!("companion-chat shutdown complete");
}
