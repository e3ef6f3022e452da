//! Multi-provider middleware adapter.
//!
//! The middleware fronts several hosted providers behind one chat API. It can
//! be reached over plain REST or over a persistent authenticated socket. The
//! socket is preferred when enabled. REST is used only when the socket cannot
//! be opened or authenticated; once a request is sent its outcome is final.

mod rest;
mod socket;

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::error::{ProviderError, ProviderResult};
use crate::types::MiddlewareUpstream;
use crate::LEGAL_SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use rest::RestTransport;
pub use socket::{SocketFailure, SocketTransport};

/// One chat turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat body shared by both transports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    pub provider: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatPayload {
    fn from_request(request: &LlmRequest, upstream: MiddlewareUpstream, default_model: Option<&str>) -> Self {
        let system = request.system.as_deref().unwrap_or(LEGAL_SYSTEM_PROMPT);
        let model = Some(request.model.as_str())
            .filter(|m| !m.is_empty())
            .or(default_model)
            .map(str::to_string);

        Self {
            provider: upstream.as_str().to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            max_tokens: request.max_tokens.unwrap_or(512),
            model,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessageBody>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageBody {
    #[serde(default)]
    content: String,
}

/// Provider metadata the middleware attaches to a completion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub attempts: Option<u32>,
}

/// Completion body returned by either transport.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(rename = "_meta", default)]
    pub meta: Option<ResponseMeta>,
}

impl ChatCompletion {
    fn into_response(self, fallback_model: &str) -> ProviderResult<LlmResponse> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| match choice.message {
                Some(message) => Some(message.content),
                None => choice.text,
            })
            .unwrap_or_default();
        let content = content.trim().to_string();

        if content.is_empty() {
            return Err(ProviderError::MalformedResponse(
                "middleware returned no completion text".to_string(),
            ));
        }

        let meta = self.meta.unwrap_or_default();
        if let Some(attempts) = meta.attempts.filter(|a| *a > 1) {
            tracing::debug!("Middleware needed {} upstream attempts", attempts);
        }

        Ok(LlmResponse {
            content,
            model: meta.model.unwrap_or_else(|| {
                if fallback_model.is_empty() {
                    "unknown".to_string()
                } else {
                    fallback_model.to_string()
                }
            }),
            usage: LlmUsage::default(),
            done: true,
        })
    }
}

/// Client for the multi-provider middleware.
pub struct MiddlewareClient {
    rest: RestTransport,
    socket: Option<SocketTransport>,
    upstream: MiddlewareUpstream,
    default_model: Option<String>,
}

impl MiddlewareClient {
    pub fn new(
        base_url: &str,
        secret: String,
        upstream: MiddlewareUpstream,
        default_model: Option<String>,
        use_socket: bool,
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let socket = use_socket.then(|| {
            SocketTransport::new(&base_url, secret.clone(), connect_timeout, response_timeout)
        });

        Self {
            rest: RestTransport::new(base_url, secret, response_timeout),
            socket,
            upstream,
            default_model,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MiddlewareClient {
    fn provider_name(&self) -> &str {
        "multiprovider"
    }

    async fn complete(&self, request: &LlmRequest) -> ProviderResult<LlmResponse> {
        let payload = ChatPayload::from_request(request, self.upstream, self.default_model.as_deref());
        let model = payload.model.clone().unwrap_or_default();

        if let Some(socket) = &self.socket {
            match socket.chat(&payload).await {
                Ok(completion) => return completion.into_response(&model),
                Err(SocketFailure::Provider(err)) => return Err(err),
                Err(SocketFailure::Transport(reason)) => {
                    tracing::warn!("Socket unavailable, falling back to REST: {}", reason);
                }
            }
        }

        self.rest.chat(&payload).await?.into_response(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_tungstenite::tungstenite::Message;

    /// Socket server that authenticates every client and never answers a chat.
    /// Counts accepted TCP connections, REST attempts included.
    async fn unresponsive_middleware() -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = connections.clone();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    let _ = ws.send(Message::Text(r#"{"type":"connected"}"#.to_string())).await;
                    while let Some(Ok(Message::Text(text))) = ws.next().await {
                        if text.contains(r#""type":"auth""#) {
                            let _ = ws
                                .send(Message::Text(r#"{"type":"auth_success"}"#.to_string()))
                                .await;
                        }
                    }
                });
            }
        });

        (format!("http://{}", addr), connections)
    }

    #[tokio::test]
    async fn test_socket_reply_timeout_is_timeout() {
        let (base_url, _) = unresponsive_middleware().await;
        let transport = SocketTransport::new(
            &base_url,
            "secret".to_string(),
            Duration::from_secs(2),
            Duration::from_millis(300),
        );
        let payload = ChatPayload::from_request(&LlmRequest::new("q", ""), MiddlewareUpstream::Groq, None);

        match transport.chat(&payload).await {
            Err(SocketFailure::Provider(err)) => assert_eq!(err.kind(), "timeout"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_socket_reply_timeout_skips_rest() {
        let (base_url, connections) = unresponsive_middleware().await;
        let client = MiddlewareClient::new(
            &base_url,
            "secret".to_string(),
            MiddlewareUpstream::Groq,
            None,
            true,
            Duration::from_secs(2),
            Duration::from_millis(300),
        );

        let err = client.complete(&LlmRequest::new("q", "")).await.unwrap_err();

        assert_eq!(err.kind(), "timeout");
        assert_eq!(connections.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_payload_shape() {
        let request = LlmRequest::new("What is bail?", "").with_max_tokens(256);
        let payload = ChatPayload::from_request(&request, MiddlewareUpstream::Groq, None);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["provider"], "groq");
        assert_eq!(json["maxTokens"], 256);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "What is bail?");
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_payload_prefers_request_model() {
        let request = LlmRequest::new("q", "llama-3.1-8b");
        let payload = ChatPayload::from_request(&request, MiddlewareUpstream::Groq, Some("other"));
        assert_eq!(payload.model.as_deref(), Some("llama-3.1-8b"));
    }

    #[test]
    fn test_completion_from_message_or_text() {
        let raw = r#"{"choices":[{"message":{"content":"Answer"}}],"_meta":{"provider":"groq","model":"llama","attempts":2}}"#;
        let completion: ChatCompletion = serde_json::from_str(raw).unwrap();
        let response = completion.into_response("").unwrap();
        assert_eq!(response.content, "Answer");
        assert_eq!(response.model, "llama");

        let raw = r#"{"choices":[{"text":"Plain"}]}"#;
        let completion: ChatCompletion = serde_json::from_str(raw).unwrap();
        let response = completion.into_response("").unwrap();
        assert_eq!(response.content, "Plain");
        assert_eq!(response.model, "unknown");
    }

    #[test]
    fn test_empty_choices_is_malformed() {
        let completion: ChatCompletion = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(completion.into_response("m").unwrap_err().kind(), "malformed_response");
    }
}
