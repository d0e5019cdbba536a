//! Conversational core for the Bells campus assistant.
//!
//! Normalizes free-text questions, matches them against an ordered keyword
//! rule table, renders canned response documents and manages the single
//! conversation session with its pending-turn state machine.

pub mod error;
pub mod matcher;
pub mod normalizer;
pub mod orchestrator;
pub mod responder;
pub mod response;
pub mod session;

pub use error::ChatError;
pub use matcher::{match_intent, IntentMatcher, IntentRule, TemplateId};
pub use normalizer::{normalize, NormalizedQuery};
pub use orchestrator::{ChatOrchestrator, TurnCompletion, TurnHandle};
pub use responder::{CannedResponder, Responder};
pub use response::{backend_fallback, capability_overview, ResponseRenderer, TemplateLibrary};
pub use session::{ConversationSession, PendingToken, TurnOutcome, TurnState};
