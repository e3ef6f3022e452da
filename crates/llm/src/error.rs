//! Provider error taxonomy.
//!
//! Every adapter maps HTTP statuses, transport failures and provider error
//! payloads into one of five kinds. Callers use `is_retryable` to decide
//! whether trying again later makes sense, and `user_message` to produce the
//! plain-text answer shown instead of a legal response.

use nyaya_core::AppError;
use thiserror::Error;

/// Normalized generation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Short kind label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::RateLimited(_) => "rate_limited",
            Self::Timeout(_) => "timeout",
            Self::Unreachable(_) => "unreachable",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    /// Whether a later retry (after backoff) could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Unreachable(_))
    }

    /// Connection refused/reset and similar transport failures.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// Plain-text message safe to show to the end user.
    ///
    /// Always starts with `Error:` so downstream formatting can recognize it.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(_) => {
                "Error: The language model provider rejected the configured credentials. Please check the API key."
            }
            Self::RateLimited(_) => {
                "Error: The language model provider is rate limiting requests. Please try again shortly."
            }
            Self::Timeout(_) => {
                "Error: Request timed out. The model may be loading or the query is too complex."
            }
            Self::Unreachable(_) => {
                "Error: Cannot reach the language model provider. Make sure it is running and reachable."
            }
            Self::MalformedResponse(_) => {
                "Error: The language model returned an unexpected response. Please try again."
            }
        }
        .to_string()
    }

    /// Map a reqwest transport error.
    ///
    /// The request URL is dropped from the message: it can carry credentials.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }

    /// Map a non-success HTTP status and its body.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, 200));
        match status.as_u16() {
            401 | 403 => Self::Auth(detail),
            429 => Self::RateLimited(detail),
            408 | 504 => Self::Timeout(detail),
            500..=599 => Self::Unreachable(detail),
            _ => Self::MalformedResponse(detail),
        }
    }

    /// Classify a free-text error reported inside a provider payload.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("api key")
            || lower.contains("api_key")
            || lower.contains("unauthorized")
            || lower.contains("auth")
        {
            Self::Auth(message.to_string())
        } else if lower.contains("rate limit") || lower.contains("quota") || lower.contains("429") {
            Self::RateLimited(message.to_string())
        } else if lower.contains("timed out") || lower.contains("timeout") {
            Self::Timeout(message.to_string())
        } else if lower.contains("unavailable") || lower.contains("connect") {
            Self::Unreachable(message.to_string())
        } else {
            Self::MalformedResponse(message.to_string())
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Llm(err.to_string())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ProviderError::from_status(StatusCode::UNAUTHORIZED, "bad secret").kind(),
            "auth"
        );
        assert_eq!(
            ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, "").kind(),
            "rate_limited"
        );
        assert_eq!(
            ProviderError::from_status(StatusCode::GATEWAY_TIMEOUT, "").kind(),
            "timeout"
        );
        assert_eq!(
            ProviderError::from_status(StatusCode::BAD_GATEWAY, "").kind(),
            "unreachable"
        );
        assert_eq!(
            ProviderError::from_status(StatusCode::BAD_REQUEST, "").kind(),
            "malformed_response"
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ProviderError::RateLimited(String::new()).is_retryable());
        assert!(ProviderError::Unreachable(String::new()).is_retryable());
        assert!(!ProviderError::Auth(String::new()).is_retryable());
        assert!(!ProviderError::Timeout(String::new()).is_retryable());
        assert!(!ProviderError::MalformedResponse(String::new()).is_retryable());
    }

    #[test]
    fn test_user_messages_are_error_markers() {
        let errors = [
            ProviderError::Auth("sk-live-123".into()),
            ProviderError::RateLimited("sk-live-123".into()),
            ProviderError::Timeout("sk-live-123".into()),
            ProviderError::Unreachable("sk-live-123".into()),
            ProviderError::MalformedResponse("sk-live-123".into()),
        ];
        for err in errors {
            let message = err.user_message();
            assert!(message.starts_with("Error:"));
            assert!(!message.contains("sk-live-123"), "internal detail leaked: {}", message);
        }
    }

    #[test]
    fn test_message_classification() {
        assert_eq!(ProviderError::from_message("Invalid API key").kind(), "auth");
        assert_eq!(
            ProviderError::from_message("Quota exceeded for model").kind(),
            "rate_limited"
        );
        assert_eq!(
            ProviderError::from_message("upstream timed out").kind(),
            "timeout"
        );
        assert_eq!(
            ProviderError::from_message("something odd").kind(),
            "malformed_response"
        );
    }

    #[test]
    fn test_into_app_error() {
        let err: AppError = ProviderError::Timeout("slow".into()).into();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
