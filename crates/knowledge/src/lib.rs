//! Statute knowledge base and question answering.
//!
//! Indexes Indian statutes into a vector store and answers questions over
//! them: section references are resolved exactly, everything else goes
//! through semantic search, and a web search covers what the index cannot.

pub mod analyzer;
pub mod chunker;
pub mod context;
pub mod embeddings;
pub mod health;
pub mod indexer;
pub mod lancedb_index;
pub mod memory_index;
pub mod rag;
pub mod relevance;
pub mod retriever;
pub mod types;
pub mod vector_index;
pub mod web_search;


pub use analyzer::{expand_query, extract_section_reference};
pub use context::ContextAssembler;
pub use embeddings::{create_provider, EmbeddingProvider, MockProvider, OllamaProvider};
pub use health::{check_health, HealthReport};
pub use indexer::{IndexStats, StatuteIndexer, StatuteRecord};
pub use lancedb_index::LanceDbIndex;
pub use memory_index::InMemoryIndex;
pub use rag::{AnswerOrchestrator, AskResponse, OrchestratorSettings, SourceCitation};
pub use relevance::RelevanceGate;
pub use retriever::HybridRetriever;
pub use types::{ActType, DocumentMetadata, RetrievedDocument, SectionReference, WebResult};
pub use vector_index::{IndexRecord, VectorIndex};
pub use web_search::{TavilyClient, WebSearch};
