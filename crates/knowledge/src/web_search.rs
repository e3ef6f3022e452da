//! Web search fallback (Tavily).

use crate::types::WebResult;
use nyaya_core::config::WebSearchSettings;
use nyaya_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Search collaborator consulted when local retrieval is not relevant.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Results ordered by the provider's relevance score.
    async fn search(&self, query: &str) -> AppResult<Vec<WebResult>>;
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: String,
    search_depth: &'a str,
    max_results: usize,
    include_answer: bool,
    include_domains: &'a [String],
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<WebResult>,
    #[serde(default)]
    answer: Option<String>,
}

/// Tavily search restricted to the configured authoritative domains.
#[derive(Debug, Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
    endpoint: String,
    search_depth: String,
    max_results: usize,
    include_domains: Vec<String>,
}

impl TavilyClient {
    pub fn new(settings: &WebSearchSettings) -> AppResult<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::WebSearch("TAVILY_API_KEY is not set".to_string()))?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::WebSearch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: settings.endpoint.clone(),
            search_depth: settings.search_depth.clone(),
            max_results: settings.max_results,
            include_domains: settings.include_domains.clone(),
        })
    }

    fn request<'a>(&'a self, query: &str) -> TavilyRequest<'a> {
        TavilyRequest {
            api_key: &self.api_key,
            query: format!("Indian law legal {}", query),
            search_depth: &self.search_depth,
            max_results: self.max_results,
            include_answer: true,
            include_domains: &self.include_domains,
        }
    }
}

#[async_trait::async_trait]
impl WebSearch for TavilyClient {
    async fn search(&self, query: &str) -> AppResult<Vec<WebResult>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.request(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::WebSearch("Web search timed out".to_string())
                } else {
                    AppError::WebSearch(format!("Web search failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::WebSearch(format!(
                "Tavily API error: {} - {}",
                status.as_u16(),
                body
            )));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::WebSearch(format!("Invalid Tavily response: {}", e)))?;

        if let Some(answer) = body.answer.as_deref().filter(|a| !a.is_empty()) {
            tracing::debug!("Tavily summary: {}", answer);
        }

        Ok(body.results)
    }
}
