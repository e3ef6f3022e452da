//! Command handlers for the Nyaya CLI.

pub mod ask;
pub mod health;
pub mod index;

pub use ask::AskCommand;
pub use health::HealthCommand;
pub use index::IndexCommand;
