//! Health command handler.

use crate::services;
use clap::Args;
use nyaya_core::{config::AppConfig, AppError, AppResult};
use nyaya_knowledge::{check_health, HealthReport};

/// Report index and model status
#[derive(Args, Debug)]
pub struct HealthCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HealthCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing health command");

        let collection = &config.retrieval.table;
        let report = match services::open_index(config).await {
            Ok(index) => {
                check_health(
                    index.as_ref(),
                    collection,
                    &config.embedding.model,
                    &config.llm.provider,
                )
                .await
            }
            // Reported, not raised: health must answer even without an index
            Err(e) => HealthReport::unavailable(
                collection,
                &config.embedding.model,
                &config.llm.provider,
                e.to_string(),
            ),
        };

        if self.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("Status: {}", report.status);
            println!("  Collection: {}", report.collection);
            println!("  Documents: {}", report.document_count);
            println!("  Embedding model: {}", report.embedding_model);
            println!("  LLM provider: {}", report.llm_provider);
            if let Some(error) = &report.error {
                println!("  Error: {}", error);
            }
        }

        Ok(())
    }
}
