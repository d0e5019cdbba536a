//! Error types for the chat pipeline.

use bells_core::error::BellsError;

/// Errors from the chat pipeline.
///
/// None of these are fatal: after any of them the session is back in (or
/// never left) the idle turn state.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptyInput,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("a response is already pending")]
    PendingAlreadyActive,
    #[error("pending token does not match the current turn")]
    InvalidToken,
    #[error("response backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("session was closed before the turn completed")]
    SessionClosed,
    #[error("storage error: {0}")]
    StorageError(String),
}

impl ChatError {
    /// Whether the error should be surfaced to the person typing.
    ///
    /// Race guards and stale completions are logged only.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            ChatError::Disabled
                | ChatError::EmptyInput
                | ChatError::MessageTooLong(_)
                | ChatError::BackendUnavailable(_)
        )
    }
}

impl From<ChatError> for BellsError {
    fn from(err: ChatError) -> Self {
        BellsError::Chat(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::Disabled.to_string(), "chat is disabled");
        assert_eq!(ChatError::EmptyInput.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::PendingAlreadyActive.to_string(),
            "a response is already pending"
        );
        assert_eq!(
            ChatError::InvalidToken.to_string(),
            "pending token does not match the current turn"
        );
        assert_eq!(
            ChatError::BackendUnavailable("timeout".to_string()).to_string(),
            "response backend unavailable: timeout"
        );
        assert_eq!(
            ChatError::SessionClosed.to_string(),
            "session was closed before the turn completed"
        );
        assert_eq!(
            ChatError::StorageError("lock poisoned".to_string()).to_string(),
            "storage error: lock poisoned"
        );
    }

    #[test]
    fn test_user_visible_errors() {
        assert!(ChatError::EmptyInput.is_user_visible());
        assert!(ChatError::Disabled.is_user_visible());
        assert!(ChatError::MessageTooLong(10).is_user_visible());
        assert!(ChatError::BackendUnavailable("down".to_string()).is_user_visible());
    }

    #[test]
    fn test_internal_errors_are_not_user_visible() {
        assert!(!ChatError::PendingAlreadyActive.is_user_visible());
        assert!(!ChatError::InvalidToken.is_user_visible());
        assert!(!ChatError::SessionClosed.is_user_visible());
        assert!(!ChatError::StorageError("x".to_string()).is_user_visible());
    }

    #[test]
    fn test_chat_error_into_bells_error() {
        let err: BellsError = ChatError::PendingAlreadyActive.into();
        assert!(matches!(err, BellsError::Chat(_)));
        assert!(err.to_string().contains("already pending"));
    }

    #[test]
    fn test_message_too_long_boundary_zero() {
        assert_eq!(
            ChatError::MessageTooLong(0).to_string(),
            "message exceeds maximum length of 0 characters"
        );
    }
}
