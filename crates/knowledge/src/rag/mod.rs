//! Retrieval-augmented answering over the statute index.

pub mod ask;
pub mod sources;
pub mod types;

pub use ask::{validate_query, AnswerOrchestrator, OrchestratorSettings, MAX_QUERY_CHARS};
pub use types::{AskResponse, SourceCitation};
