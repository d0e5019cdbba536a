use thiserror::Error;

/// Top-level error type for the Bells workspace.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for BellsError` so that `?` works across crate
/// boundaries in the binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BellsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for BellsError {
    fn from(err: toml::de::Error) -> Self {
        BellsError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BellsError {
    fn from(err: toml::ser::Error) -> Self {
        BellsError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BellsError {
    fn from(err: serde_json::Error) -> Self {
        BellsError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Bells operations.
pub type Result<T> = std::result::Result<T, BellsError>;
