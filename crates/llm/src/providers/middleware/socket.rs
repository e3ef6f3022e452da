use super::{ChatChoice, ChatCompletion, ChatPayload, ResponseMeta};
use crate::error::ProviderError;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a socket exchange failed.
#[derive(Debug)]
pub enum SocketFailure {
    /// Connect, handshake or send failed before the request reached the
    /// middleware; REST may still work.
    Transport(String),
    /// The request was sent, or the middleware refused it. Not retried over REST.
    Provider(ProviderError),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage<'a> {
    Auth {
        #[serde(rename = "secretCode")]
        secret_code: &'a str,
    },
    Chat {
        #[serde(rename = "requestId")]
        request_id: &'a str,
        #[serde(flatten)]
        payload: &'a ChatPayload,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Connected,
    AuthSuccess,
    AuthError {
        #[serde(default)]
        message: Option<String>,
    },
    ChatResponse {
        #[serde(rename = "requestId", default)]
        request_id: Option<String>,
        #[serde(default)]
        choices: Vec<ChatChoice>,
        #[serde(rename = "_meta", default)]
        meta: Option<ResponseMeta>,
    },
    ChatError {
        #[serde(rename = "requestId", default)]
        request_id: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// Persistent, authenticated socket to the middleware.
///
/// One exchange at a time: the connection lives behind an async mutex and is
/// dropped after any transport failure so the next call reconnects.
pub struct SocketTransport {
    url: String,
    secret: String,
    connect_timeout: Duration,
    response_timeout: Duration,
    connection: Mutex<Option<Socket>>,
    counter: AtomicU64,
}

impl SocketTransport {
    pub fn new(base_url: &str, secret: String, connect_timeout: Duration, response_timeout: Duration) -> Self {
        Self {
            url: socket_url(base_url),
            secret,
            connect_timeout,
            response_timeout,
            connection: Mutex::new(None),
            counter: AtomicU64::new(0),
        }
    }

    fn next_request_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("req_{}_{}", chrono::Utc::now().timestamp_millis(), n)
    }

    pub async fn chat(&self, payload: &ChatPayload) -> Result<ChatCompletion, SocketFailure> {
        let mut guard = self.connection.lock().await;

        if guard.is_none() {
            let socket = tokio::time::timeout(self.connect_timeout, self.connect())
                .await
                .map_err(|_| SocketFailure::Transport("socket connect timed out".to_string()))??;
            *guard = Some(socket);
        }

        let Some(socket) = guard.as_mut() else {
            return Err(SocketFailure::Transport("socket not connected".to_string()));
        };

        let request_id = self.next_request_id();
        let result = match tokio::time::timeout(
            self.response_timeout,
            exchange(socket, &request_id, payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SocketFailure::Provider(ProviderError::Timeout(format!(
                "no response to {} within {:.1}s",
                request_id,
                self.response_timeout.as_secs_f64()
            )))),
        };

        // A late reply would be read as the answer to the next request.
        if result.is_err() {
            *guard = None;
        }
        result
    }

    async fn connect(&self) -> Result<Socket, SocketFailure> {
        tracing::debug!("Connecting to middleware socket: {}", self.url);

        let (mut socket, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| SocketFailure::Transport(e.to_string()))?;

        match next_message(&mut socket).await? {
            ServerMessage::Connected => {}
            _ => tracing::debug!("Unexpected first socket message; continuing with auth"),
        }

        send_json(&mut socket, &ClientMessage::Auth { secret_code: &self.secret }).await?;

        match next_message(&mut socket).await? {
            ServerMessage::AuthSuccess => {
                tracing::info!("Middleware socket authenticated");
                Ok(socket)
            }
            ServerMessage::AuthError { message } => Err(SocketFailure::Provider(ProviderError::Auth(
                message.unwrap_or_else(|| "authentication failed".to_string()),
            ))),
            _ => Err(SocketFailure::Transport(
                "unexpected reply to socket auth".to_string(),
            )),
        }
    }
}

async fn exchange(
    socket: &mut Socket,
    request_id: &str,
    payload: &ChatPayload,
) -> Result<ChatCompletion, SocketFailure> {
    send_json(socket, &ClientMessage::Chat { request_id, payload }).await?;

    // The request is out; replaying it over REST could run it twice.
    loop {
        let message = next_message(socket).await.map_err(|failure| match failure {
            SocketFailure::Transport(reason) => SocketFailure::Provider(ProviderError::Unreachable(
                format!("socket dropped while awaiting {}: {}", request_id, reason),
            )),
            other => other,
        })?;

        match message {
            ServerMessage::ChatResponse {
                request_id: id,
                choices,
                meta,
            } if matches_request(id.as_deref(), request_id) => {
                return Ok(ChatCompletion { choices, meta });
            }
            ServerMessage::ChatError {
                request_id: id,
                message,
            } if matches_request(id.as_deref(), request_id) => {
                let message = message.unwrap_or_else(|| "middleware chat error".to_string());
                return Err(SocketFailure::Provider(ProviderError::from_message(&message)));
            }
            _ => continue,
        }
    }
}

fn matches_request(received: Option<&str>, expected: &str) -> bool {
    received == Some(expected)
}

async fn send_json<T: Serialize>(socket: &mut Socket, message: &T) -> Result<(), SocketFailure> {
    let text = serde_json::to_string(message).map_err(|e| SocketFailure::Transport(e.to_string()))?;
    socket
        .send(Message::Text(text))
        .await
        .map_err(|e| SocketFailure::Transport(e.to_string()))
}

async fn next_message(socket: &mut Socket) -> Result<ServerMessage, SocketFailure> {
    loop {
        let frame = socket
            .next()
            .await
            .ok_or_else(|| SocketFailure::Transport("socket closed".to_string()))?
            .map_err(|e| SocketFailure::Transport(e.to_string()))?;

        match frame {
            Message::Text(text) => {
                return serde_json::from_str(&text).map_err(|e| {
                    SocketFailure::Transport(format!("invalid socket message: {}", e))
                });
            }
            Message::Close(_) => return Err(SocketFailure::Transport("socket closed".to_string())),
            // ping/pong are answered by tungstenite
            _ => continue,
        }
    }
}

fn socket_url(base_url: &str) -> String {
    let url = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base_url.to_string()
    };
    format!("{}/ws", url.trim_end_matches('/'))
}
