//! Answer orchestration.
//!
//! Sequences retrieval, the relevance gate, context assembly, prompt
//! rendering, generation and the response safety pipeline for one query.

use crate::context::{no_information_context, ContextAssembler};
use crate::rag::sources::{local_citations, web_citations};
use crate::rag::types::AskResponse;
use crate::relevance::RelevanceGate;
use crate::retriever::HybridRetriever;
use crate::types::{RetrievedDocument, WebResult};
use crate::web_search::WebSearch;
use nyaya_core::{AppConfig, AppError, AppResult};
use nyaya_llm::{LlmClient, LlmRequest, ProviderError};
use nyaya_prompt::{build_prompt, BuiltPrompt, PromptDefinition};
use nyaya_safety::{check_quality, SafetyPipeline};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Accepted query length, in characters.
pub const MAX_QUERY_CHARS: usize = 2000;

/// Knobs the orchestrator needs from configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub top_k: usize,
    pub relevance_threshold: f32,
    pub max_context_length: usize,
    pub web_snippet_chars: usize,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub generation_timeout: Duration,
    pub max_words: usize,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            relevance_threshold: config.retrieval.relevance_threshold,
            max_context_length: config.retrieval.max_context_length,
            web_snippet_chars: config.retrieval.web_snippet_chars,
            model: config.llm.active_model(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            generation_timeout: Duration::from_secs(config.llm.timeout_secs),
            max_words: config.safety.max_words,
        }
    }
}

struct Generator {
    client: Arc<dyn LlmClient>,
    model: String,
}

/// Where the prompt context came from.
enum ContextSource {
    Local,
    Web(Vec<WebResult>),
}

/// Answers one legal question end to end.
///
/// Per-request collaborator failures never surface as errors: retrieval and
/// web search degrade to smaller contexts, and provider failures become a
/// user-safe message in `answer`. Only query validation and prompt
/// rendering return `Err`.
pub struct AnswerOrchestrator {
    retriever: HybridRetriever,
    gate: RelevanceGate,
    assembler: ContextAssembler,
    web_search: Option<Arc<dyn WebSearch>>,
    generator: Generator,
    web_generator: Option<Generator>,
    prompt: PromptDefinition,
    safety: SafetyPipeline,
    settings: OrchestratorSettings,
}

impl AnswerOrchestrator {
    pub fn new(
        retriever: HybridRetriever,
        llm: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        safety: SafetyPipeline,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            retriever,
            gate: RelevanceGate::new(settings.relevance_threshold),
            assembler: ContextAssembler::new(
                settings.max_context_length,
                settings.web_snippet_chars,
            ),
            web_search: None,
            generator: Generator {
                client: llm,
                model: settings.model.clone(),
            },
            web_generator: None,
            prompt,
            safety,
            settings,
        }
    }

    /// Enable the web-search fallback.
    pub fn with_web_search(mut self, web_search: Arc<dyn WebSearch>) -> Self {
        self.web_search = Some(web_search);
        self
    }

    /// Answer web-grounded queries with a different generator.
    pub fn with_web_answer_client(mut self, client: Arc<dyn LlmClient>, model: String) -> Self {
        self.web_generator = Some(Generator { client, model });
        self
    }

    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn ask(&self, query: &str) -> AppResult<AskResponse> {
        validate_query(query)?;

        let candidates = self.retriever.retrieve(query, self.settings.top_k).await;
        let relevant = self.gate.is_relevant(&candidates, query);
        info!(
            candidates = candidates.len(),
            best_distance = candidates.first().map(|d| d.distance),
            relevant,
            "Relevance decision"
        );

        let (context, source) = if relevant {
            (self.assembler.build_local(&candidates), ContextSource::Local)
        } else {
            self.fallback_context(query, &candidates).await
        };

        let used_web_search = matches!(source, ContextSource::Web(_));
        info!(used_web_search, "Context assembled");

        let prompt = build_prompt(&self.prompt, query, &context)?;
        let generator = match (&source, &self.web_generator) {
            (ContextSource::Web(_), Some(web)) => {
                debug!("Using web answer provider '{}'", web.client.provider_name());
                web
            }
            _ => &self.generator,
        };

        let (answer, sources) = match self.generate(generator, &prompt).await {
            Ok(raw) => {
                let answer = self.safety.process(&raw, query);
                let report = check_quality(&answer, self.settings.max_words);
                debug!(
                    words = report.word_count,
                    within_limit = report.within_limit,
                    score = report.score,
                    forbidden = report.forbidden_phrases_remaining.len(),
                    "Answer quality"
                );

                let sources = match &source {
                    ContextSource::Web(results) => web_citations(results),
                    ContextSource::Local => local_citations(&candidates),
                };
                (answer, sources)
            }
            Err(err) => {
                // Error messages skip the safety pipeline and carry no sources
                warn!(
                    kind = err.kind(),
                    retryable = err.is_retryable(),
                    "Generation failed: {}",
                    err
                );
                (err.user_message(), Vec::new())
            }
        };

        Ok(AskResponse {
            answer,
            query: query.to_string(),
            num_retrieved_docs: candidates.len(),
            used_web_search,
            sources,
        })
    }

    async fn fallback_context(
        &self,
        query: &str,
        candidates: &[RetrievedDocument],
    ) -> (String, ContextSource) {
        let Some(web_search) = &self.web_search else {
            info!("Web search not configured, using local results");
            return (self.local_or_nothing(query, candidates), ContextSource::Local);
        };

        info!("Local results not relevant, trying web search");
        match web_search.search(query).await {
            Ok(results) if !results.is_empty() => {
                info!(results = results.len(), "Web search succeeded");
                (self.assembler.build_web(&results), ContextSource::Web(results))
            }
            Ok(_) => {
                info!("Web search returned no results");
                (self.local_or_nothing(query, candidates), ContextSource::Local)
            }
            Err(e) => {
                warn!("Web search unavailable: {}", e);
                (self.local_or_nothing(query, candidates), ContextSource::Local)
            }
        }
    }

    fn local_or_nothing(&self, query: &str, candidates: &[RetrievedDocument]) -> String {
        if candidates.is_empty() {
            no_information_context(query)
        } else {
            self.assembler.build_local(candidates)
        }
    }

    async fn generate(
        &self,
        generator: &Generator,
        prompt: &BuiltPrompt,
    ) -> Result<String, ProviderError> {
        let mut request = LlmRequest::new(prompt.user.clone(), generator.model.clone())
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature);
        if let Some(system) = &prompt.system {
            request = request.with_system(system.clone());
        }

        debug!(
            provider = generator.client.provider_name(),
            model = %generator.model,
            prompt_id = %prompt.source_prompt_id,
            "Calling language model"
        );

        let timeout = self.settings.generation_timeout;
        let response = tokio::time::timeout(timeout, generator.client.complete(&request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!("no response within {}s", timeout.as_secs()))
            })??;

        Ok(response.content)
    }
}

/// Reject empty and oversized queries before any collaborator is called.
pub fn validate_query(query: &str) -> AppResult<()> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidQuery("query must not be empty".to_string()));
    }

    let length = query.chars().count();
    if length > MAX_QUERY_CHARS {
        return Err(AppError::InvalidQuery(format!(
            "query is {} characters; the limit is {}",
            length, MAX_QUERY_CHARS
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_query() {
        assert!(validate_query("What is bail?").is_ok());
        assert!(matches!(
            validate_query("   \n"),
            Err(AppError::InvalidQuery(_))
        ));
        assert!(validate_query(&"a".repeat(MAX_QUERY_CHARS)).is_ok());
        assert!(matches!(
            validate_query(&"a".repeat(MAX_QUERY_CHARS + 1)),
            Err(AppError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_settings_from_default_config() {
        let config = AppConfig::default();
        let settings = OrchestratorSettings::from_config(&config);
        assert_eq!(settings.top_k, 10);
        assert_eq!(settings.relevance_threshold, 0.5);
        assert_eq!(settings.max_words, 280);
        assert_eq!(settings.generation_timeout, Duration::from_secs(120));
    }
}
