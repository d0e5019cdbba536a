//! Conversation session state.
//!
//! A session owns the ordered message log, the `Welcome`/`Active` mode and
//! the per-turn state machine:
//! - Idle -> Pending (response requested)
//! - Pending -> Resolved (assistant message appended)
//! - Pending -> Cancelled (no message appended)
//! - Resolved -> Idle, Cancelled -> Idle (immediately, ready for the next turn)
//!
//! At most one turn is pending at a time.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use bells_core::types::{
    Message, MessageContent, MessageId, ResponseDocument, Role, SessionId, SessionMode, TurnId,
};

use crate::error::ChatError;

// =============================================================================
// Turn state machine
// =============================================================================

/// Lifecycle state of the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnState {
    /// No response outstanding.
    Idle,
    /// A response has been requested and not yet resolved.
    Pending,
    /// The response arrived and was appended.
    Resolved,
    /// The pending response was abandoned.
    Cancelled,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnState::Idle => write!(f, "Idle"),
            TurnState::Pending => write!(f, "Pending"),
            TurnState::Resolved => write!(f, "Resolved"),
            TurnState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl TurnState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &TurnState) -> bool {
        matches!(
            (self, target),
            (TurnState::Idle, TurnState::Pending)
                | (TurnState::Pending, TurnState::Resolved)
                | (TurnState::Pending, TurnState::Cancelled)
                | (TurnState::Resolved, TurnState::Idle)
                | (TurnState::Cancelled, TurnState::Idle)
        )
    }
}

/// How the most recent turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Resolved(MessageId),
    Cancelled,
}

/// Proof of ownership of the pending turn.
///
/// Returned by [`ConversationSession::begin_pending`] and required to
/// resolve or cancel that turn, so a stale completion cannot land in a
/// later turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingToken {
    turn_id: TurnId,
}

impl PendingToken {
    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }
}

// =============================================================================
// ConversationSession
// =============================================================================

/// A single conversation: mode, message log and pending-turn state.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: SessionId,
    started_at: DateTime<Utc>,
    mode: SessionMode,
    messages: Vec<Message>,
    state: TurnState,
    pending: Option<PendingToken>,
    last_outcome: Option<TurnOutcome>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    /// Create a fresh session in `Welcome` mode with an empty log.
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            started_at: Utc::now(),
            mode: SessionMode::Welcome,
            messages: Vec::new(),
            state: TurnState::Idle,
            pending: None,
            last_outcome: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn turn_state(&self) -> TurnState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_token(&self) -> Option<&PendingToken> {
        self.pending.as_ref()
    }

    pub fn last_outcome(&self) -> Option<TurnOutcome> {
        self.last_outcome
    }

    /// Append a user message.
    ///
    /// Fails with `EmptyInput` if the trimmed text is empty; in that case
    /// nothing is appended and the mode is unchanged. The first accepted
    /// message moves the session from `Welcome` to `Active`.
    pub fn submit_user_message(&mut self, text: &str) -> Result<MessageId, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let id = self.append(Role::User, MessageContent::Text(text.to_string()));

        if self.mode == SessionMode::Welcome {
            tracing::debug!(session_id = %self.id, "Session mode: Welcome -> Active");
            self.mode = SessionMode::Active;
        }

        Ok(id)
    }

    /// Mark the session as awaiting a response.
    ///
    /// Fails with `PendingAlreadyActive` if a turn is already pending.
    pub fn begin_pending(&mut self) -> Result<PendingToken, ChatError> {
        if self.pending.is_some() {
            return Err(ChatError::PendingAlreadyActive);
        }
        self.transition(TurnState::Pending)?;

        let token = PendingToken {
            turn_id: TurnId::new(),
        };
        self.pending = Some(token.clone());
        Ok(token)
    }

    /// Append the assistant message for the pending turn and clear it.
    ///
    /// Fails with `InvalidToken` if `token` is not the current pending one.
    pub fn resolve_pending(
        &mut self,
        token: &PendingToken,
        document: ResponseDocument,
    ) -> Result<MessageId, ChatError> {
        self.check_token(token)?;
        self.transition(TurnState::Resolved)?;

        let id = self.append(Role::Assistant, MessageContent::Document(document));
        self.pending = None;
        self.last_outcome = Some(TurnOutcome::Resolved(id));
        self.transition(TurnState::Idle)?;
        Ok(id)
    }

    /// Abandon the pending turn without appending anything.
    ///
    /// Fails with `InvalidToken` if `token` is not the current pending one,
    /// leaving the session untouched.
    pub fn cancel_pending(&mut self, token: &PendingToken) -> Result<(), ChatError> {
        self.check_token(token)?;
        self.transition(TurnState::Cancelled)?;

        self.pending = None;
        self.last_outcome = Some(TurnOutcome::Cancelled);
        self.transition(TurnState::Idle)?;
        Ok(())
    }

    // -- Private helpers --

    fn check_token(&self, token: &PendingToken) -> Result<(), ChatError> {
        match &self.pending {
            Some(current) if current == token => Ok(()),
            _ => {
                tracing::warn!(
                    session_id = %self.id,
                    turn_id = %token.turn_id,
                    "Rejected stale or unknown pending token"
                );
                Err(ChatError::InvalidToken)
            }
        }
    }

    fn transition(&mut self, target: TurnState) -> Result<(), ChatError> {
        if self.state.can_transition_to(&target) {
            tracing::trace!(session_id = %self.id, "Turn state: {} -> {}", self.state, target);
            self.state = target;
            Ok(())
        } else {
            Err(ChatError::StorageError(format!(
                "Invalid turn transition: {} -> {}",
                self.state, target
            )))
        }
    }

    fn append(&mut self, role: Role, content: MessageContent) -> MessageId {
        let id = MessageId::new();
        let timestamp = self.next_timestamp();
        self.messages.push(Message {
            id,
            role,
            content,
            timestamp,
        });
        id
    }

    /// Wall-clock time, nudged forward so log timestamps strictly increase.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.messages.last() {
            Some(last) if now <= last.timestamp => last.timestamp + Duration::microseconds(1),
            _ => now,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> ResponseDocument {
        ResponseDocument::new().paragraph(text)
    }

    // ---- Turn state machine ----

    #[test]
    fn test_turn_state_display() {
        assert_eq!(TurnState::Idle.to_string(), "Idle");
        assert_eq!(TurnState::Pending.to_string(), "Pending");
        assert_eq!(TurnState::Resolved.to_string(), "Resolved");
        assert_eq!(TurnState::Cancelled.to_string(), "Cancelled");
    }

    #[test]
    fn test_valid_turn_transitions() {
        assert!(TurnState::Idle.can_transition_to(&TurnState::Pending));
        assert!(TurnState::Pending.can_transition_to(&TurnState::Resolved));
        assert!(TurnState::Pending.can_transition_to(&TurnState::Cancelled));
        assert!(TurnState::Resolved.can_transition_to(&TurnState::Idle));
        assert!(TurnState::Cancelled.can_transition_to(&TurnState::Idle));
    }

    #[test]
    fn test_invalid_turn_transitions() {
        assert!(!TurnState::Idle.can_transition_to(&TurnState::Resolved));
        assert!(!TurnState::Idle.can_transition_to(&TurnState::Cancelled));
        assert!(!TurnState::Pending.can_transition_to(&TurnState::Pending));
        assert!(!TurnState::Pending.can_transition_to(&TurnState::Idle));
        assert!(!TurnState::Resolved.can_transition_to(&TurnState::Pending));
        assert!(!TurnState::Cancelled.can_transition_to(&TurnState::Resolved));
    }

    #[test]
    fn test_valid_transition_count() {
        let all = [
            TurnState::Idle,
            TurnState::Pending,
            TurnState::Resolved,
            TurnState::Cancelled,
        ];
        let count = all
            .iter()
            .flat_map(|from| all.iter().map(move |to| (from, to)))
            .filter(|(from, to)| from.can_transition_to(to))
            .count();
        assert_eq!(count, 5);
    }

    // ---- Construction ----

    #[test]
    fn test_new_session() {
        let session = ConversationSession::new();
        assert_eq!(session.mode(), SessionMode::Welcome);
        assert_eq!(session.turn_state(), TurnState::Idle);
        assert!(session.messages().is_empty());
        assert!(!session.is_pending());
        assert!(session.last_outcome().is_none());
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(ConversationSession::new().id(), ConversationSession::new().id());
    }

    // ---- submit_user_message ----

    #[test]
    fn test_submit_appends_trimmed_user_message() {
        let mut session = ConversationSession::new();
        let id = session.submit_user_message("  Where is the library?  ").unwrap();
        assert_eq!(session.message_count(), 1);
        let msg = session.last_message().unwrap();
        assert_eq!(msg.id, id);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), Some("Where is the library?"));
    }

    #[test]
    fn test_mode_welcome_until_first_submit_then_active_forever() {
        let mut session = ConversationSession::new();
        assert_eq!(session.mode(), SessionMode::Welcome);

        session.submit_user_message("first").unwrap();
        assert_eq!(session.mode(), SessionMode::Active);

        let token = session.begin_pending().unwrap();
        assert_eq!(session.mode(), SessionMode::Active);
        session.cancel_pending(&token).unwrap();
        assert_eq!(session.mode(), SessionMode::Active);

        session.submit_user_message("second").unwrap();
        assert_eq!(session.mode(), SessionMode::Active);

        let _ = session.submit_user_message("   ");
        assert_eq!(session.mode(), SessionMode::Active);
    }

    #[test]
    fn test_empty_input_rejected_without_side_effects() {
        let mut session = ConversationSession::new();
        for input in ["", "   ", "\t\n"] {
            let result = session.submit_user_message(input);
            assert!(matches!(result, Err(ChatError::EmptyInput)));
        }
        assert!(session.messages().is_empty());
        assert_eq!(session.mode(), SessionMode::Welcome);
        assert_eq!(session.turn_state(), TurnState::Idle);
    }

    // ---- begin_pending ----

    #[test]
    fn test_begin_pending_marks_pending() {
        let mut session = ConversationSession::new();
        session.submit_user_message("hello").unwrap();
        let token = session.begin_pending().unwrap();
        assert!(session.is_pending());
        assert_eq!(session.pending_token(), Some(&token));
        assert_eq!(session.turn_state(), TurnState::Pending);
    }

    #[test]
    fn test_second_begin_pending_fails() {
        let mut session = ConversationSession::new();
        let first = session.begin_pending().unwrap();
        let result = session.begin_pending();
        assert!(matches!(result, Err(ChatError::PendingAlreadyActive)));
        // Original pending turn untouched
        assert_eq!(session.pending_token(), Some(&first));
        assert_eq!(session.turn_state(), TurnState::Pending);
    }

    #[test]
    fn test_tokens_are_unique_per_turn() {
        let mut session = ConversationSession::new();
        let a = session.begin_pending().unwrap();
        session.cancel_pending(&a).unwrap();
        let b = session.begin_pending().unwrap();
        assert_ne!(a, b);
        assert_ne!(a.turn_id(), b.turn_id());
    }

    // ---- resolve_pending ----

    #[test]
    fn test_resolve_appends_assistant_message() {
        let mut session = ConversationSession::new();
        session.submit_user_message("hello").unwrap();
        let token = session.begin_pending().unwrap();
        let id = session.resolve_pending(&token, doc("hi there")).unwrap();

        assert_eq!(session.message_count(), 2);
        let msg = session.last_message().unwrap();
        assert_eq!(msg.id, id);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.document(), Some(&doc("hi there")));
        assert!(!session.is_pending());
        assert_eq!(session.turn_state(), TurnState::Idle);
        assert_eq!(session.last_outcome(), Some(TurnOutcome::Resolved(id)));
    }

    #[test]
    fn test_resolve_with_wrong_token_fails() {
        let mut session = ConversationSession::new();
        let stale = session.begin_pending().unwrap();
        session.cancel_pending(&stale).unwrap();
        let current = session.begin_pending().unwrap();

        let result = session.resolve_pending(&stale, doc("late"));
        assert!(matches!(result, Err(ChatError::InvalidToken)));
        assert!(session.messages().is_empty());
        assert_eq!(session.pending_token(), Some(&current));
    }

    #[test]
    fn test_resolve_without_pending_fails() {
        let mut session = ConversationSession::new();
        let token = session.begin_pending().unwrap();
        session.resolve_pending(&token, doc("one")).unwrap();

        let again = session.resolve_pending(&token, doc("duplicate"));
        assert!(matches!(again, Err(ChatError::InvalidToken)));
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.turn_state(), TurnState::Idle);
    }

    // ---- cancel_pending ----

    #[test]
    fn test_cancel_returns_to_idle_without_message() {
        let mut session = ConversationSession::new();
        session.submit_user_message("hello").unwrap();
        let token = session.begin_pending().unwrap();
        session.cancel_pending(&token).unwrap();

        assert_eq!(session.message_count(), 1);
        assert!(!session.is_pending());
        assert_eq!(session.turn_state(), TurnState::Idle);
        assert_eq!(session.last_outcome(), Some(TurnOutcome::Cancelled));

        // Next turn works normally
        session.submit_user_message("again").unwrap();
        let next = session.begin_pending().unwrap();
        session.resolve_pending(&next, doc("ok")).unwrap();
        assert_eq!(session.message_count(), 3);
    }

    #[test]
    fn test_cancel_with_stale_token_leaves_state() {
        let mut session = ConversationSession::new();
        let old = session.begin_pending().unwrap();
        session.resolve_pending(&old, doc("done")).unwrap();
        let current = session.begin_pending().unwrap();

        let result = session.cancel_pending(&old);
        assert!(matches!(result, Err(ChatError::InvalidToken)));
        assert_eq!(session.pending_token(), Some(&current));
        assert_eq!(session.turn_state(), TurnState::Pending);
    }

    // ---- Ordering ----

    #[test]
    fn test_timestamps_strictly_increase() {
        let mut session = ConversationSession::new();
        for i in 0..50 {
            session.submit_user_message(&format!("message {}", i)).unwrap();
            let token = session.begin_pending().unwrap();
            session.resolve_pending(&token, doc("reply")).unwrap();
        }
        let messages = session.messages();
        assert_eq!(messages.len(), 100);
        for pair in messages.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn test_log_preserves_insertion_order() {
        let mut session = ConversationSession::new();
        session.submit_user_message("first").unwrap();
        let token = session.begin_pending().unwrap();
        session.resolve_pending(&token, doc("reply")).unwrap();
        session.submit_user_message("second").unwrap();

        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(session.messages()[2].text(), Some("second"));
    }
}
