//! Ollama provider.
//!
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::error::{ProviderError, ProviderResult};
use crate::LEGAL_SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TOP_P: f32 = 0.9;
const DEFAULT_TOP_K: u32 = 40;
const DEFAULT_NUM_PREDICT: u32 = 512;
const CONTEXT_WINDOW: u32 = 4096;

/// Ollama `/api/generate` request.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    system: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    num_predict: u32,
    num_ctx: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    response: String,
    #[serde(default = "default_done")]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

fn default_done() -> bool {
    true
}

/// Local Ollama client.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new Ollama client with a custom base URL and request timeout.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    fn to_ollama_request(&self, request: &LlmRequest) -> OllamaRequest {
        OllamaRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request
                .system
                .clone()
                .unwrap_or_else(|| LEGAL_SYSTEM_PROMPT.to_string()),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                top_p: request.top_p.unwrap_or(DEFAULT_TOP_P),
                top_k: request.top_k.unwrap_or(DEFAULT_TOP_K),
                num_predict: request.max_tokens.unwrap_or(DEFAULT_NUM_PREDICT),
                num_ctx: CONTEXT_WINDOW,
            },
        }
    }

    fn convert_response(response: OllamaResponse, requested_model: &str) -> ProviderResult<LlmResponse> {
        if let Some(error) = response.error {
            return Err(ProviderError::from_message(&error));
        }

        let content = response.response.trim().to_string();
        if content.is_empty() {
            return Err(ProviderError::MalformedResponse(
                "Ollama returned an empty response".to_string(),
            ));
        }

        let model = if response.model.is_empty() {
            requested_model.to_string()
        } else {
            response.model
        };

        Ok(LlmResponse {
            content,
            model,
            usage: LlmUsage::new(
                response.prompt_eval_count.unwrap_or(0),
                response.eval_count.unwrap_or(0),
            ),
            done: response.done,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "local"
    }

    async fn complete(&self, request: &LlmRequest) -> ProviderResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending completion request to Ollama");

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&self.to_ollama_request(request))
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(ProviderError::from_reqwest)?;

        tracing::debug!(
            "Ollama generated {} tokens",
            ollama_response.eval_count.unwrap_or(0)
        );

        Self::convert_response(ollama_response, &request.model)
    }
}
