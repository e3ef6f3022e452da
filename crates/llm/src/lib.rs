//! LLM integration crate for Nyaya.
//!
//! Provides a provider-agnostic `LlmClient` abstraction with one adapter per
//! generation backend, a shared error taxonomy, and a retry decorator for
//! connection-level failures.
//!
//! # Providers
//! - **Local**: Ollama daemon (`/api/generate`)
//! - **Cloud**: Gemini REST (`generateContent`)
//! - **Multiprovider**: middleware with REST and socket transports
//!
//! # Example
//! ```no_run
//! use nyaya_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::with_base_url("http://localhost:11434", Duration::from_secs(120));
//! let request = LlmRequest::new("What is bail?", "llama3.2:1b");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod factory;
pub mod providers;
pub mod retry;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use error::{ProviderError, ProviderResult};
pub use factory::{create_client, create_client_for};
pub use providers::{GeminiClient, MiddlewareClient, OllamaClient};
pub use retry::{RetryPolicy, RetryingClient};
pub use types::{MiddlewareUpstream, ProviderKind};

/// System prompt sent with every generation request.
pub const LEGAL_SYSTEM_PROMPT: &str =
    "You are a knowledgeable legal assistant specializing in Indian law.";
