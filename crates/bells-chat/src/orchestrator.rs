//! Chat orchestrator: central coordinator wiring session, responder and events.
//!
//! Owns the single conversation session, runs each turn as a spawned task
//! raced against a cancellation token, and broadcasts [`ChatEvent`]s for the
//! presentation layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use bells_core::config::ChatConfig;
use bells_core::events::ChatEvent;
use bells_core::types::{Message, MessageId, ResponseDocument, SessionId, SessionMode, TurnId};

use crate::error::ChatError;
use crate::responder::{CannedResponder, Responder};
use crate::response::backend_fallback;
use crate::session::{ConversationSession, PendingToken};

/// How a submitted turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnCompletion {
    /// The assistant message was appended.
    Resolved(Message),
    /// The turn was cancelled before a response arrived.
    Cancelled,
    /// The backend failed; `fallback` replaces the answer.
    Failed {
        reason: String,
        fallback: ResponseDocument,
    },
}

impl TurnCompletion {
    pub fn is_resolved(&self) -> bool {
        matches!(self, TurnCompletion::Resolved(_))
    }
}

/// The turn currently awaiting a response.
struct InFlight {
    session_id: SessionId,
    token: PendingToken,
    cancel: CancellationToken,
}

struct Inner {
    config: ChatConfig,
    responder: Arc<dyn Responder>,
    session: Mutex<ConversationSession>,
    in_flight: Mutex<Option<InFlight>>,
    events: broadcast::Sender<ChatEvent>,
    closed: AtomicBool,
}

// =============================================================================
// ChatOrchestrator
// =============================================================================

/// Central chat coordinator.
///
/// Lock order is `in_flight` then `session`; neither is held across an
/// await point.
pub struct ChatOrchestrator {
    inner: Arc<Inner>,
}

impl ChatOrchestrator {
    /// Create an orchestrator answering with the canned campus responder.
    pub fn new(config: ChatConfig) -> Self {
        let responder = CannedResponder::campus(Duration::from_millis(config.response_delay_ms));
        Self::with_responder(config, Arc::new(responder))
    }

    /// Create an orchestrator with a custom response backend.
    pub fn with_responder(config: ChatConfig, responder: Arc<dyn Responder>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let session = ConversationSession::new();
        let session_id = session.id();

        let orchestrator = Self {
            inner: Arc::new(Inner {
                config,
                responder,
                session: Mutex::new(session),
                in_flight: Mutex::new(None),
                events,
                closed: AtomicBool::new(false),
            }),
        };

        tracing::info!(session_id = %session_id, "Chat session started");
        orchestrator.inner.emit(ChatEvent::SessionStarted {
            session_id,
            timestamp: Utc::now(),
        });
        orchestrator
    }

    /// Subscribe to chat events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }

    pub fn config(&self) -> &ChatConfig {
        &self.inner.config
    }

    /// Submit a user query and start its turn.
    ///
    /// Must be called from within a tokio runtime. On success the user
    /// message is in the log, the turn is pending and the returned handle
    /// completes when it resolves, fails or is cancelled.
    pub fn submit(&self, raw: &str) -> Result<TurnHandle, ChatError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(ChatError::SessionClosed);
        }
        if !self.inner.config.enabled {
            return Err(ChatError::Disabled);
        }

        let text = raw.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        let max = self.inner.config.max_message_length;
        if text.chars().count() > max {
            return Err(ChatError::MessageTooLong(max));
        }

        let mut in_flight = self.inner.lock_in_flight()?;
        let (session_id, user_message, token) = {
            let mut session = self.inner.lock_session()?;
            if in_flight.is_some() || session.is_pending() {
                tracing::debug!(session_id = %session.id(), "Submission ignored: turn already pending");
                return Err(ChatError::PendingAlreadyActive);
            }

            session.submit_user_message(text)?;
            let user_message = session
                .last_message()
                .cloned()
                .ok_or_else(|| ChatError::StorageError("user message missing after append".to_string()))?;
            let token = session.begin_pending()?;
            (session.id(), user_message, token)
        };

        let cancel = CancellationToken::new();
        *in_flight = Some(InFlight {
            session_id,
            token: token.clone(),
            cancel: cancel.clone(),
        });
        drop(in_flight);

        let turn_id = token.turn_id();
        tracing::info!(
            session_id = %session_id,
            turn_id = %turn_id,
            chars = text.chars().count(),
            "Turn started"
        );

        let user_message_id = user_message.id;
        self.inner.emit(ChatEvent::UserMessageAdded {
            session_id,
            message: user_message,
        });
        self.inner.emit(ChatEvent::PendingStarted {
            session_id,
            turn_id,
            timestamp: Utc::now(),
        });

        let inner = Arc::clone(&self.inner);
        let query = text.to_string();
        let task_token = token.clone();
        let join = tokio::spawn(async move {
            let result = tokio::select! {
                biased;

                () = cancel.cancelled() => None,
                result = inner.responder.respond(&query) => Some(result),
            };

            match result {
                Some(result) => inner.finish_turn(session_id, &task_token, result),
                None => {
                    tracing::debug!(turn_id = %task_token.turn_id(), "Turn task observed cancellation");
                    TurnCompletion::Cancelled
                }
            }
        });

        Ok(TurnHandle {
            session_id,
            turn_id,
            user_message_id,
            token,
            inner: Arc::clone(&self.inner),
            join,
        })
    }

    /// Cancel the pending turn, if any. Returns whether one was cancelled.
    pub fn cancel_current(&self) -> Result<bool, ChatError> {
        self.inner.cancel_in_flight(None)
    }

    /// Cancel any pending turn and start a fresh `Welcome` session.
    pub fn new_conversation(&self) -> Result<SessionId, ChatError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(ChatError::SessionClosed);
        }
        self.inner.cancel_in_flight(None)?;

        let session_id = {
            let mut session = self.inner.lock_session()?;
            *session = ConversationSession::new();
            session.id()
        };

        tracing::info!(session_id = %session_id, "Chat session started");
        self.inner.emit(ChatEvent::SessionStarted {
            session_id,
            timestamp: Utc::now(),
        });
        Ok(session_id)
    }

    /// Cancel any pending turn and reject further submissions.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.inner.cancel_in_flight(None) {
            Ok(true) => tracing::info!("Chat shut down with a pending turn cancelled"),
            Ok(false) => tracing::info!("Chat shut down"),
            Err(e) => tracing::error!(error = %e, "Failed to cancel pending turn on shutdown"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    // -- Snapshots --

    pub fn session_id(&self) -> Result<SessionId, ChatError> {
        Ok(self.inner.lock_session()?.id())
    }

    pub fn mode(&self) -> Result<SessionMode, ChatError> {
        Ok(self.inner.lock_session()?.mode())
    }

    pub fn is_pending(&self) -> Result<bool, ChatError> {
        Ok(self.inner.lock_session()?.is_pending())
    }

    /// Copy of the current message log.
    pub fn messages(&self) -> Result<Vec<Message>, ChatError> {
        Ok(self.inner.lock_session()?.messages().to_vec())
    }

    /// Suggested questions; empty once the session is `Active`.
    pub fn suggested_questions(&self) -> Result<Vec<String>, ChatError> {
        match self.mode()? {
            SessionMode::Welcome => Ok(self.inner.config.suggested_questions.clone()),
            SessionMode::Active => Ok(Vec::new()),
        }
    }
}

impl Drop for ChatOrchestrator {
    fn drop(&mut self) {
        if let Err(e) = self.inner.cancel_in_flight(None) {
            tracing::warn!(error = %e, "Failed to cancel pending turn on drop");
        }
    }
}

// =============================================================================
// Turn bookkeeping
// =============================================================================

impl Inner {
    fn emit(&self, event: ChatEvent) {
        // No receivers is not an error
        let _ = self.events.send(event);
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, ConversationSession>, ChatError> {
        self.session
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))
    }

    fn lock_in_flight(&self) -> Result<MutexGuard<'_, Option<InFlight>>, ChatError> {
        self.in_flight
            .lock()
            .map_err(|e| ChatError::StorageError(format!("in-flight lock poisoned: {}", e)))
    }

    /// Claim the in-flight slot for `token`. Whoever claims it finalizes
    /// the turn; a second claimant gets `None`.
    fn claim(&self, token: Option<&PendingToken>) -> Result<Option<InFlight>, ChatError> {
        let mut in_flight = self.lock_in_flight()?;
        let matches = match (in_flight.as_ref(), token) {
            (Some(current), Some(token)) => &current.token == token,
            (Some(_), None) => true,
            (None, _) => false,
        };
        Ok(if matches { in_flight.take() } else { None })
    }

    /// Cancel the in-flight turn (or only `token`'s turn, if given).
    fn cancel_in_flight(&self, token: Option<&PendingToken>) -> Result<bool, ChatError> {
        let Some(flight) = self.claim(token)? else {
            return Ok(false);
        };
        flight.cancel.cancel();

        let turn_id = flight.token.turn_id();
        {
            let mut session = self.lock_session()?;
            if let Err(e) = session.cancel_pending(&flight.token) {
                tracing::warn!(turn_id = %turn_id, error = %e, "Cancelled turn was not pending");
                return Ok(false);
            }
        }

        tracing::info!(session_id = %flight.session_id, turn_id = %turn_id, "Turn cancelled");
        self.emit_pending_ended(flight.session_id, turn_id);
        self.emit(ChatEvent::TurnCancelled {
            session_id: flight.session_id,
            turn_id,
            timestamp: Utc::now(),
        });
        Ok(true)
    }

    /// Apply the responder's result to the session.
    fn finish_turn(
        &self,
        session_id: SessionId,
        token: &PendingToken,
        result: Result<ResponseDocument, ChatError>,
    ) -> TurnCompletion {
        let turn_id = token.turn_id();
        match self.claim(Some(token)) {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::debug!(turn_id = %turn_id, "Response arrived after cancellation; dropped");
                return TurnCompletion::Cancelled;
            }
            Err(e) => {
                tracing::error!(turn_id = %turn_id, error = %e, "Failed to finish turn");
                return TurnCompletion::Cancelled;
            }
        }

        match result {
            Ok(document) => self.resolve(session_id, token, document),
            Err(e) => self.fail(session_id, token, e),
        }
    }

    fn resolve(
        &self,
        session_id: SessionId,
        token: &PendingToken,
        document: ResponseDocument,
    ) -> TurnCompletion {
        let turn_id = token.turn_id();
        let message = {
            let mut session = match self.lock_session() {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!(turn_id = %turn_id, error = %e, "Failed to resolve turn");
                    return TurnCompletion::Cancelled;
                }
            };
            match session.resolve_pending(token, document) {
                Ok(_) => session.last_message().cloned(),
                Err(e) => {
                    tracing::warn!(turn_id = %turn_id, error = %e, "Stale completion ignored");
                    return TurnCompletion::Cancelled;
                }
            }
        };

        let Some(message) = message else {
            return TurnCompletion::Cancelled;
        };

        tracing::info!(session_id = %session_id, turn_id = %turn_id, "Turn resolved");
        self.emit_pending_ended(session_id, turn_id);
        self.emit(ChatEvent::AssistantMessageResolved {
            session_id,
            turn_id,
            message: message.clone(),
        });
        TurnCompletion::Resolved(message)
    }

    fn fail(&self, session_id: SessionId, token: &PendingToken, error: ChatError) -> TurnCompletion {
        let turn_id = token.turn_id();
        let cancelled = self
            .lock_session()
            .and_then(|mut session| session.cancel_pending(token));
        if let Err(e) = cancelled {
            tracing::warn!(turn_id = %turn_id, error = %e, "Failed turn was not pending");
            return TurnCompletion::Cancelled;
        }

        let reason = error.to_string();
        let fallback = backend_fallback();
        tracing::warn!(session_id = %session_id, turn_id = %turn_id, reason = %reason, "Turn failed");
        self.emit_pending_ended(session_id, turn_id);
        self.emit(ChatEvent::TurnFailed {
            session_id,
            turn_id,
            reason: reason.clone(),
            fallback: fallback.clone(),
            timestamp: Utc::now(),
        });
        TurnCompletion::Failed { reason, fallback }
    }

    fn emit_pending_ended(&self, session_id: SessionId, turn_id: TurnId) {
        self.emit(ChatEvent::PendingEnded {
            session_id,
            turn_id,
            timestamp: Utc::now(),
        });
    }
}

// =============================================================================
// TurnHandle
// =============================================================================

/// Completion handle for a submitted turn.
pub struct TurnHandle {
    session_id: SessionId,
    turn_id: TurnId,
    user_message_id: MessageId,
    token: PendingToken,
    inner: Arc<Inner>,
    join: JoinHandle<TurnCompletion>,
}

impl TurnHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }

    pub fn user_message_id(&self) -> MessageId {
        self.user_message_id
    }

    /// Cancel this turn. Returns false if it already finished.
    pub fn cancel(&self) -> Result<bool, ChatError> {
        self.inner.cancel_in_flight(Some(&self.token))
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the turn to end.
    pub async fn wait(self) -> TurnCompletion {
        match self.join.await {
            Ok(completion) => completion,
            Err(e) => {
                tracing::error!(turn_id = %self.turn_id, error = %e, "Turn task failed");
                TurnCompletion::Cancelled
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
