//! Prompt handling for Nyaya.
//!
//! A prompt is a handlebars template with two slots, `{{context}}` and
//! `{{question}}`. Definitions are loaded once from YAML (or a plain text
//! template); a built-in legal template is used when no file is configured or
//! the configured file is missing.

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{load_or_default, load_prompt};
pub use types::{BuiltPrompt, PromptDefinition};
