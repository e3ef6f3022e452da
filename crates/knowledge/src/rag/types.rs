//! Answer response types.

use serde::{Deserialize, Serialize};

/// Attribution for one retrieved source.
///
/// Shown to the caller only; never fed back into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Display name ("IPC Section 420", a web page title)
    pub source: String,

    /// Section number, or "Web"
    pub section: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Retrieval distance rounded to 3 decimals; web hits use `1 - score`
    pub distance: f32,
}

/// Result of one `ask` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub query: String,

    /// Size of the local candidate set, even when the web answered
    pub num_retrieved_docs: usize,

    pub used_web_search: bool,
    pub sources: Vec<SourceCitation>,
}
