//! Generation backend adapters.

pub mod gemini;
pub mod middleware;
pub mod ollama;

pub use gemini::GeminiClient;
pub use middleware::MiddlewareClient;
pub use ollama::OllamaClient;
