//! Ask command handler.
//!
//! Answers one legal question from the statute index, falling back to web
//! search when the index has nothing relevant.

use crate::services;
use clap::Args;
use nyaya_core::{config::AppConfig, AppError, AppResult};
use nyaya_knowledge::AskResponse;

/// Ask a question about Indian law
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Number of candidates to retrieve (overrides retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let mut config = config.clone();
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }

        let orchestrator = services::orchestrator(&config).await?;
        let response = orchestrator.ask(&self.query).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&response)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            print_response(&response);
        }

        Ok(())
    }
}

fn print_response(response: &AskResponse) {
    println!("{}", response.answer);
    println!();

    if response.sources.is_empty() {
        println!("Sources: (none)");
        return;
    }

    if response.used_web_search {
        println!("Sources (web search):");
    } else {
        println!("Sources ({} documents retrieved):", response.num_retrieved_docs);
    }
    for source in &response.sources {
        match &source.url {
            Some(url) => println!("- {} ({})", source.source, url),
            None => println!("- {}", source.source),
        }
    }
}
