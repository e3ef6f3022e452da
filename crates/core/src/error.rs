//! Error types for Nyaya.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! generation, retrieval, web search and prompt failures.

use thiserror::Error;

/// Unified error type for Nyaya.
///
/// Per-request collaborator failures are absorbed by the orchestrator and
/// turned into degraded answers. Only `IndexNotInitialized`, `Config` and
/// `InvalidQuery` are meant to reach the caller.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base and indexing errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Embedding or vector index call failed
    #[error("Retrieval unavailable: {0}")]
    Retrieval(String),

    /// Web search not configured or request failed
    #[error("Web search unavailable: {0}")]
    WebSearch(String),

    /// The backing vector collection is missing or empty
    #[error("Index not initialized: {0}")]
    IndexNotInitialized(String),

    /// Query rejected before processing
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_maps_to_serialization() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[test]
    fn test_display_prefixes() {
        let err = AppError::IndexNotInitialized("collection is empty".to_string());
        assert_eq!(err.to_string(), "Index not initialized: collection is empty");

        let err = AppError::InvalidQuery("empty".to_string());
        assert!(err.to_string().starts_with("Invalid query"));
    }
}
