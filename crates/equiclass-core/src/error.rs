//! Error types for equiclass

use thiserror::Error;

/// Result type alias using EquiclassError
pub type Result<T> = std::result::Result<T, EquiclassError>;

/// Error type alias for convenience
pub type Error = EquiclassError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for equiclass
#[derive(Debug, Error)]
pub enum EquiclassError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    /// Request-level failure; upstream detail is logged, never surfaced.
    #[error("Classification failed for session {session_id}")]
    ClassificationFailed { session_id: String },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl EquiclassError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SessionNotFound(_) => exit_codes::NOT_FOUND,
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            EquiclassError::InvalidInput("no images".into()).exit_code(),
            exit_codes::INVALID_INPUT
        );
        assert_eq!(
            EquiclassError::SessionNotFound("abc".into()).exit_code(),
            exit_codes::NOT_FOUND
        );
        assert_eq!(
            EquiclassError::ClassificationFailed {
                session_id: "abc".into()
            }
            .exit_code(),
            exit_codes::GENERAL_ERROR
        );
    }

    #[test]
    fn test_classification_failed_hides_detail() {
        let err = EquiclassError::ClassificationFailed {
            session_id: "s-1".into(),
        };
        assert_eq!(err.to_string(), "Classification failed for session s-1");
    }
}
