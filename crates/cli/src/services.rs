//! Builds the shared collaborators once per process.

use nyaya_core::{AppConfig, AppError, AppResult};
use nyaya_knowledge::{
    create_provider, AnswerOrchestrator, EmbeddingProvider, HybridRetriever, LanceDbIndex,
    OrchestratorSettings, TavilyClient, VectorIndex,
};
use nyaya_llm::{create_client, create_client_for};
use nyaya_prompt::load_or_default;
use nyaya_safety::{PipelineConfig, SafetyPipeline};
use std::sync::Arc;
use std::time::Duration;

pub fn embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    create_provider(
        &config.embedding,
        Duration::from_secs(config.retrieval.retrieval_timeout_secs),
    )
}

/// Open the existing index. Fails when it was never built.
pub async fn open_index(config: &AppConfig) -> AppResult<Arc<LanceDbIndex>> {
    let index = LanceDbIndex::open(
        &config.index_path(),
        &config.retrieval.table,
        config.embedding.dimensions,
    )
    .await?;
    Ok(Arc::new(index))
}

/// Open the index for writing, creating it on first use.
pub async fn open_or_create_index(config: &AppConfig) -> AppResult<Arc<LanceDbIndex>> {
    let index = LanceDbIndex::open_or_create(
        &config.index_path(),
        &config.retrieval.table,
        config.embedding.dimensions,
    )
    .await?;
    Ok(Arc::new(index))
}

/// Wire the full answering stack.
///
/// Refuses to start when the index is missing or empty.
pub async fn orchestrator(config: &AppConfig) -> AppResult<AnswerOrchestrator> {
    config.validate()?;

    let embedder = embedder(config)?;
    let index = open_index(config).await?;
    let count = index.count().await?;
    if count == 0 {
        return Err(AppError::IndexNotInitialized(format!(
            "collection '{}' is empty. Run 'nyaya index' first.",
            config.retrieval.table
        )));
    }
    tracing::info!(
        "Loaded collection '{}' with {} documents",
        config.retrieval.table,
        count
    );

    let retriever = HybridRetriever::new(
        embedder,
        index,
        Duration::from_secs(config.retrieval.retrieval_timeout_secs),
    );
    let llm = create_client(&config.llm)?;
    let prompt = load_or_default(config.prompt_path().as_deref());
    let safety = SafetyPipeline::new(&PipelineConfig::from_settings(&config.safety));

    let mut orchestrator = AnswerOrchestrator::new(
        retriever,
        llm,
        prompt,
        safety,
        OrchestratorSettings::from_config(config),
    );

    if config.web_search.is_configured() {
        orchestrator = orchestrator.with_web_search(Arc::new(TavilyClient::new(&config.web_search)?));
    } else {
        tracing::info!("TAVILY_API_KEY not set, web search fallback disabled");
    }

    if let Some(provider) = &config.llm.web_answer_provider {
        let client = create_client_for(provider, &config.llm)?;
        orchestrator = orchestrator.with_web_answer_client(client, config.llm.model_for(provider));
    }

    Ok(orchestrator)
}
