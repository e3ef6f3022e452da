//! Prompt definition and rendered prompt types.

use serde::{Deserialize, Serialize};

/// Identifier of the built-in legal answer template.
pub const DEFAULT_PROMPT_ID: &str = "legal.answer.default";

const DEFAULT_TEMPLATE: &str = "You are a knowledgeable legal assistant specializing in Indian law. Use the provided legal context to answer the user's question accurately and concisely.

Context:
{{context}}

Question: {{question}}

Answer: Provide a clear, accurate answer based on the legal context above. Cite specific sections, articles, or legal provisions when relevant. If the context doesn't contain enough information to answer the question, say so honestly.";

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    #[serde(default)]
    pub title: String,

    /// Overrides the provider's default system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Handlebars template with `{{context}}` and `{{question}}` slots
    pub template: String,
}

impl PromptDefinition {
    /// Built-in legal answer template.
    pub fn builtin() -> Self {
        Self {
            id: DEFAULT_PROMPT_ID.to_string(),
            title: "Indian law answer".to_string(),
            system: None,
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Wrap a raw template string.
    pub fn from_template(id: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            system: None,
            template: template.into(),
        }
    }
}

/// A fully rendered prompt ready for the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message override, if the definition carries one
    pub system: Option<String>,

    /// Rendered user message
    pub user: String,

    /// Source prompt ID
    pub source_prompt_id: String,
}
