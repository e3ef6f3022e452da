//! Gemini `generateContent` provider.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::error::{ProviderError, ProviderResult};
use crate::LEGAL_SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Hosted Gemini client.
pub struct GeminiClient {
    endpoint: String,
    api_key: String,
    max_output_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        max_output_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_output_tokens,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn to_gemini_request(&self, request: &LlmRequest) -> GenerateRequest {
        let system = request.system.as_deref().unwrap_or(LEGAL_SYSTEM_PROMPT);
        GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: request.temperature.unwrap_or(0.7),
                top_p: request.top_p.unwrap_or(0.9),
                top_k: request.top_k.unwrap_or(40),
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    fn convert_response(response: GenerateResponse, requested_model: &str) -> ProviderResult<LlmResponse> {
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            ProviderError::MalformedResponse("Gemini returned no candidates".to_string())
        })?;

        let content: String = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        let content = content.trim().to_string();

        if content.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(ProviderError::MalformedResponse(format!(
                "Gemini returned empty content (finish reason: {})",
                reason
            )));
        }

        let usage = response
            .usage_metadata
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: response
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
            usage,
            done: true,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "cloud"
    }

    async fn complete(&self, request: &LlmRequest) -> ProviderResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending completion request to Gemini");

        let url = format!("{}/models/{}:generateContent", self.endpoint, request.model);
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .timeout(self.timeout)
            .json(&self.to_gemini_request(request))
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Gemini reports a bad key as 400 INVALID_ARGUMENT
            if body.to_lowercase().contains("api key") {
                return Err(ProviderError::Auth(format!("HTTP {}", status.as_u16())));
            }
            return Err(ProviderError::from_status(status, &body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(ProviderError::from_reqwest)?;

        Self::convert_response(parsed, &request.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new("https://example.test/v1beta/", "key", 2048, Duration::from_secs(5))
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(client().to_gemini_request(&LlmRequest::new("q", "m"))).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "q");
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            LEGAL_SYSTEM_PROMPT
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(json["generationConfig"]["topK"], 40);
    }

    #[test]
    fn test_joins_candidate_parts() {
        let raw = r#"{
            "candidates": [{"content": {"parts": [{"text": "Section 420 "}, {"text": "covers cheating."}]}}],
            "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 6}
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let response = GeminiClient::convert_response(parsed, "gemini-2.0-flash").unwrap();

        assert_eq!(response.content, "Section 420 covers cheating.");
        assert_eq!(response.model, "gemini-2.0-flash");
        assert_eq!(response.usage.total_tokens, 11);
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let client = GeminiClient::new(
            "http://127.0.0.1:1/v1beta",
            "SECRET-KEY-123",
            2048,
            Duration::from_secs(2),
        );
        let err = client
            .complete(&LlmRequest::new("q", "gemini-2.0-flash"))
            .await
            .unwrap_err();

        assert!(!err.to_string().contains("SECRET-KEY-123"), "{}", err);
        assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
        assert!(!err.to_string().contains("127.0.0.1"));
    }

    #[test]
    fn test_no_candidates_is_malformed() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let err = GeminiClient::convert_response(parsed, "m").unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
    }
}
