//! Provider selection types.

use serde::{Deserialize, Serialize};

/// Generation backend, selected once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local daemon (Ollama)
    Local,
    /// Hosted API (Gemini)
    Cloud,
    /// Multi-provider middleware (REST + socket)
    Multiprovider,
}

impl ProviderKind {
    /// Parse provider kind from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" | "ollama" => Some(Self::Local),
            "cloud" | "gemini" => Some(Self::Cloud),
            "multiprovider" | "middleware" => Some(Self::Multiprovider),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
            Self::Multiprovider => "multiprovider",
        }
    }
}

/// Upstream provider the middleware routes a chat request to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiddlewareUpstream {
    OpenAi,
    Google,
    Cerebras,
    Groq,
}

impl MiddlewareUpstream {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "google" => Some(Self::Google),
            "cerebras" => Some(Self::Cerebras),
            "groq" => Some(Self::Groq),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Cerebras => "cerebras",
            Self::Groq => "groq",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!(ProviderKind::parse("local"), Some(ProviderKind::Local));
        assert_eq!(ProviderKind::parse("Ollama"), Some(ProviderKind::Local));
        assert_eq!(ProviderKind::parse("cloud"), Some(ProviderKind::Cloud));
        assert_eq!(ProviderKind::parse("gemini"), Some(ProviderKind::Cloud));
        assert_eq!(
            ProviderKind::parse("middleware"),
            Some(ProviderKind::Multiprovider)
        );
        assert_eq!(ProviderKind::parse("unknown"), None);
    }

    #[test]
    fn test_upstream_round_trip_names() {
        for name in ["openai", "google", "cerebras", "groq"] {
            let upstream = MiddlewareUpstream::parse(name).unwrap();
            assert_eq!(upstream.as_str(), name);
        }
        assert_eq!(MiddlewareUpstream::parse("anthropic"), None);
    }
}
