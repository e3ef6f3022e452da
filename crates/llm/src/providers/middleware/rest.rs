use super::{ChatCompletion, ChatPayload};
use crate::error::{ProviderError, ProviderResult};
use std::time::Duration;

/// `POST {base}/api/chat` with the shared secret header.
pub struct RestTransport {
    base_url: String,
    secret: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RestTransport {
    pub fn new(base_url: String, secret: String, timeout: Duration) -> Self {
        Self {
            base_url,
            secret,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    pub async fn chat(&self, payload: &ChatPayload) -> ProviderResult<ChatCompletion> {
        let url = format!("{}/api/chat", self.base_url);
        tracing::info!(provider = %payload.provider, "Sending REST chat request to middleware");

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .header("x-secret-code", &self.secret)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        tracing::debug!(
            "Middleware responded with {} in {:.2}s",
            status.as_u16(),
            start.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}
