//! Embedding providers.
//!
//! The retriever and the indexer only see [`EmbeddingProvider`]; which
//! backend sits behind it is decided once from `embedding.provider`.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{MockProvider, OllamaProvider};
