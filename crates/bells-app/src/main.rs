//! Bells application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the chat orchestrator
//! 4. Either answer a single `--once` question, or run the interactive loop
//!    with a background task rendering orchestrator events

mod cli;
mod render;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use bells_chat::{ChatError, ChatOrchestrator, TurnCompletion};
use bells_core::config::BellsConfig;
use bells_core::events::ChatEvent;
use bells_core::types::SessionMode;

use cli::CliArgs;
use render::TerminalView;

/// Print a block of text and flush stdout.
fn emit(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

fn prompt() {
    emit("> ");
}

/// Render orchestrator events until the channel closes.
async fn event_loop(mut rx: broadcast::Receiver<ChatEvent>, view: TerminalView) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                tracing::trace!(event = event.event_name(), "Chat event");
                let ends_turn = matches!(
                    event,
                    ChatEvent::AssistantMessageResolved { .. }
                        | ChatEvent::TurnCancelled { .. }
                        | ChatEvent::TurnFailed { .. }
                );
                if let Some(text) = view.render_event(&event) {
                    emit(&text);
                }
                if ends_turn {
                    prompt();
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event renderer lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Answer a single question and exit.
async fn run_once(
    orchestrator: &ChatOrchestrator,
    question: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = orchestrator.submit(question)?;
    if !json {
        emit(&format!("{}\n", render::TYPING_INDICATOR));
    }

    match handle.wait().await {
        TurnCompletion::Resolved(message) => {
            if json {
                if let Some(document) = message.document() {
                    emit(&format!("{}\n", serde_json::to_string_pretty(document)?));
                }
            } else {
                emit(&render::render_message(&message));
            }
        }
        TurnCompletion::Failed { fallback, .. } => {
            if json {
                emit(&format!("{}\n", serde_json::to_string_pretty(&fallback)?));
            } else {
                emit(&render::render_document(&fallback));
            }
        }
        TurnCompletion::Cancelled => emit("(response cancelled)\n"),
    }
    Ok(())
}

/// Map a numeric choice to a suggested question while in `Welcome` mode.
fn pick_suggestion(orchestrator: &ChatOrchestrator, line: &str) -> Option<String> {
    let index: usize = line.parse().ok()?;
    if orchestrator.mode().ok()? != SessionMode::Welcome {
        return None;
    }
    let suggestions = orchestrator.suggested_questions().ok()?;
    index.checked_sub(1).and_then(|i| suggestions.get(i).cloned())
}

/// Handle one line of interactive input. Returns false to quit.
fn handle_line(orchestrator: &ChatOrchestrator, line: &str) -> bool {
    let line = line.trim();
    match line {
        "/quit" | "/exit" => return false,
        "/new" => {
            match orchestrator.new_conversation() {
                Ok(_) => {
                    let suggestions = orchestrator.suggested_questions().unwrap_or_default();
                    emit(&render::render_welcome(&suggestions));
                }
                Err(e) => tracing::error!(error = %e, "Failed to start a new conversation"),
            }
            prompt();
            return true;
        }
        "/cancel" => {
            match orchestrator.cancel_current() {
                Ok(true) => {}
                Ok(false) => {
                    emit("Nothing to cancel.\n");
                    prompt();
                }
                Err(e) => tracing::error!(error = %e, "Failed to cancel turn"),
            }
            return true;
        }
        _ => {}
    }

    let question = pick_suggestion(orchestrator, line).unwrap_or_else(|| line.to_string());
    match orchestrator.submit(&question) {
        // Completion is rendered by the event loop
        Ok(_handle) => {}
        Err(ChatError::PendingAlreadyActive) => {
            emit("Please wait for the current answer.\n");
        }
        Err(e) if e.is_user_visible() => {
            emit(&format!("{}\n", e));
            prompt();
        }
        Err(e) => {
            tracing::error!(error = %e, "Submission failed");
            prompt();
        }
    }
    true
}

/// Interactive loop over stdin lines until EOF, `/quit` or Ctrl-C.
async fn run_interactive(orchestrator: Arc<ChatOrchestrator>, json: bool) {
    let renderer = tokio::spawn(event_loop(
        orchestrator.subscribe(),
        TerminalView::new(json, false),
    ));

    let suggestions = orchestrator.suggested_questions().unwrap_or_default();
    emit(&render::render_welcome(&suggestions));
    emit("Commands: /new, /cancel, /quit\n\n");
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !handle_line(&orchestrator, &line) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read input");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                emit("\n");
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    orchestrator.shutdown();
    renderer.abort();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config (logged once tracing is up).
    let config_file = args.resolve_config_path();
    let loaded = BellsConfig::load(&config_file);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => BellsConfig::default(),
    };

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Bells v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(_) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Err(e) if config_file.exists() => {
            tracing::warn!(path = %config_file.display(), error = %e, "Invalid config, using defaults")
        }
        Err(_) => tracing::debug!(path = %config_file.display(), "No config file, using defaults"),
    }

    config.chat.response_delay_ms = args.resolve_delay_ms(config.chat.response_delay_ms);
    tracing::debug!(
        delay_ms = config.chat.response_delay_ms,
        max_message_length = config.chat.max_message_length,
        "Chat configured"
    );

    let orchestrator = Arc::new(ChatOrchestrator::new(config.chat));

    if let Some(question) = args.once.as_deref() {
        let result = run_once(&orchestrator, question, args.json).await;
        orchestrator.shutdown();
        return result;
    }

    run_interactive(orchestrator, args.json).await;
    Ok(())
}
