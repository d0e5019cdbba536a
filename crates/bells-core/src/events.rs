use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Message, ResponseDocument, SessionId, TurnId};

/// Events emitted by the chat orchestrator for the presentation layer.
///
/// A successful turn produces, in order: `UserMessageAdded`,
/// `PendingStarted`, `PendingEnded`, `AssistantMessageResolved`.
/// A cancelled turn ends with `PendingEnded` followed by `TurnCancelled`;
/// a failed one with `PendingEnded` followed by `TurnFailed`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ChatEvent {
    /// A fresh conversation session was opened.
    SessionStarted {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },

    /// A user message was accepted and appended to the log.
    UserMessageAdded {
        session_id: SessionId,
        message: Message,
    },

    /// A response was requested; the view should show the typing indicator.
    PendingStarted {
        session_id: SessionId,
        turn_id: TurnId,
        timestamp: DateTime<Utc>,
    },

    /// The pending response finished (resolved, cancelled or failed).
    PendingEnded {
        session_id: SessionId,
        turn_id: TurnId,
        timestamp: DateTime<Utc>,
    },

    /// The assistant message for a turn was appended to the log.
    AssistantMessageResolved {
        session_id: SessionId,
        turn_id: TurnId,
        message: Message,
    },

    /// A pending turn was cancelled before it resolved.
    TurnCancelled {
        session_id: SessionId,
        turn_id: TurnId,
        timestamp: DateTime<Utc>,
    },

    /// The response backend failed; `fallback` is shown in place of an answer.
    TurnFailed {
        session_id: SessionId,
        turn_id: TurnId,
        reason: String,
        fallback: ResponseDocument,
        timestamp: DateTime<Utc>,
    },
}

impl ChatEvent {
    /// Returns the time the event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ChatEvent::SessionStarted { timestamp, .. }
            | ChatEvent::PendingStarted { timestamp, .. }
            | ChatEvent::PendingEnded { timestamp, .. }
            | ChatEvent::TurnCancelled { timestamp, .. }
            | ChatEvent::TurnFailed { timestamp, .. } => *timestamp,
            ChatEvent::UserMessageAdded { message, .. }
            | ChatEvent::AssistantMessageResolved { message, .. } => message.timestamp,
        }
    }

    /// Returns the session the event belongs to.
    pub fn session_id(&self) -> SessionId {
        match self {
            ChatEvent::SessionStarted { session_id, .. }
            | ChatEvent::UserMessageAdded { session_id, .. }
            | ChatEvent::PendingStarted { session_id, .. }
            | ChatEvent::PendingEnded { session_id, .. }
            | ChatEvent::AssistantMessageResolved { session_id, .. }
            | ChatEvent::TurnCancelled { session_id, .. }
            | ChatEvent::TurnFailed { session_id, .. } => *session_id,
        }
    }

    /// Returns a stable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            ChatEvent::SessionStarted { .. } => "session_started",
            ChatEvent::UserMessageAdded { .. } => "user_message_added",
            ChatEvent::PendingStarted { .. } => "pending_started",
            ChatEvent::PendingEnded { .. } => "pending_ended",
            ChatEvent::AssistantMessageResolved { .. } => "assistant_message_resolved",
            ChatEvent::TurnCancelled { .. } => "turn_cancelled",
            ChatEvent::TurnFailed { .. } => "turn_failed",
        }
    }
}
