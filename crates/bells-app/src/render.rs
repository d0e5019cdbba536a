//! Terminal rendering of conversation events.

use std::fmt::Write;

use bells_core::events::ChatEvent;
use bells_core::types::{ContentBlock, Message, MessageContent, ResponseDocument, Role};

pub const TYPING_INDICATOR: &str = "Assistant is typing...";

/// Render a response document as indented plain text.
pub fn render_document(document: &ResponseDocument) -> String {
    let mut out = String::new();
    for block in &document.blocks {
        match block {
            ContentBlock::Paragraph { text } => {
                let _ = writeln!(out, "  {}", text);
            }
            ContentBlock::InfoCard { title, icon, items } => {
                let _ = writeln!(out, "  [{}] {}", icon, title);
                for item in items {
                    let _ = writeln!(out, "    - {}", item);
                }
            }
            ContentBlock::Hint { text } => {
                let _ = writeln!(out, "  Tip: {}", text);
            }
        }
    }
    out
}

/// Render a message with its sender and local display time.
pub fn render_message(message: &Message) -> String {
    let sender = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    let mut out = format!("{} ({})\n", sender, message.display_time());
    match &message.content {
        MessageContent::Text(text) => {
            let _ = writeln!(out, "  {}", text);
        }
        MessageContent::Document(document) => out.push_str(&render_document(document)),
    }
    out
}

/// Welcome banner listing numbered suggested questions.
pub fn render_welcome(suggestions: &[String]) -> String {
    let mut out = String::from(
        "Welcome to the Campus Assistant!\n\
         Ask about library hours, campus events, offices or WiFi.\n",
    );
    if !suggestions.is_empty() {
        out.push_str("\nPopular questions:\n");
        for (i, question) in suggestions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, question);
        }
        out.push_str("\nType a number to ask one of these.\n");
    }
    out
}

/// Turns orchestrator events into terminal output.
pub struct TerminalView {
    json: bool,
    echo_user: bool,
}

impl TerminalView {
    /// `echo_user` prints user messages back; off for interactive input,
    /// where the typed line is already on screen.
    pub fn new(json: bool, echo_user: bool) -> Self {
        Self { json, echo_user }
    }

    /// Text to print for `event`, if any.
    pub fn render_event(&self, event: &ChatEvent) -> Option<String> {
        match event {
            ChatEvent::UserMessageAdded { message, .. } if self.echo_user && !self.json => {
                Some(render_message(message))
            }
            ChatEvent::PendingStarted { .. } if !self.json => Some(format!("{}\n", TYPING_INDICATOR)),
            ChatEvent::AssistantMessageResolved { message, .. } => {
                if self.json {
                    message.document().and_then(|doc| match serde_json::to_string_pretty(doc) {
                        Ok(json) => Some(format!("{}\n", json)),
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize response");
                            None
                        }
                    })
                } else {
                    Some(render_message(message))
                }
            }
            ChatEvent::TurnCancelled { .. } if !self.json => {
                Some("(response cancelled)\n".to_string())
            }
            ChatEvent::TurnFailed { fallback, .. } => {
                if self.json {
                    serde_json::to_string_pretty(fallback)
                        .ok()
                        .map(|json| format!("{}\n", json))
                } else {
                    Some(format!("Assistant\n{}", render_document(fallback)))
                }
            }
            _ => None,
        }
    }
}
