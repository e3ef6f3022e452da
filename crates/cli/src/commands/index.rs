//! Index command handler.
//!
//! Embeds scraped statute JSON into the LanceDB collection.

use crate::services;
use clap::Args;
use nyaya_core::{config::AppConfig, AppError, AppResult};
use nyaya_knowledge::{IndexStats, StatuteIndexer, VectorIndex};
use std::path::PathBuf;
use std::time::Instant;

/// Build or update the statute index
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Act to index (ipc, crpc, cpc, evidence). Defaults to the file name
    #[arg(long)]
    pub act: Option<String>,

    /// Index a single JSON file
    #[arg(short, long, conflicts_with = "data_dir")]
    pub file: Option<PathBuf>,

    /// Directory of `{act}.json` files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Drop all indexed documents first
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command");

        let embedder = services::embedder(config)?;
        let index = services::open_or_create_index(config).await?;

        if self.reset {
            tracing::info!("Resetting collection '{}'", config.retrieval.table);
            index.reset().await?;
        }

        let indexer = StatuteIndexer::new(embedder, index.clone());
        let stats = match (&self.file, &self.act) {
            (Some(file), act) => self.index_one(&indexer, file.clone(), act.as_deref()).await?,
            (None, Some(act)) => {
                let file = self.resolve_dir(config).join(format!("{}.json", act.to_lowercase()));
                self.index_one(&indexer, file, Some(act)).await?
            }
            (None, None) => indexer.index_dir(&self.resolve_dir(config)).await?,
        };

        let total = index.count().await?;

        if self.json {
            let output = serde_json::json!({
                "collection": config.retrieval.table,
                "files": stats.files,
                "sections": stats.sections,
                "chunks": stats.chunks,
                "skippedFiles": stats.skipped_files,
                "documentCount": total,
                "durationSecs": stats.duration_secs,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!(
                "Indexed {} chunks from {} sections in {} files in {:.2}s",
                stats.chunks, stats.sections, stats.files, stats.duration_secs
            );
            if stats.skipped_files > 0 {
                println!("Skipped {} files (see log for details)", stats.skipped_files);
            }
            println!("Collection '{}' now holds {} documents", config.retrieval.table, total);
        }

        Ok(())
    }

    async fn index_one(
        &self,
        indexer: &StatuteIndexer,
        file: PathBuf,
        act: Option<&str>,
    ) -> AppResult<IndexStats> {
        let start = Instant::now();
        let (sections, chunks) = indexer.index_file(&file, act).await?;
        Ok(IndexStats {
            files: 1,
            sections,
            chunks,
            skipped_files: 0,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }

    fn resolve_dir(&self, config: &AppConfig) -> PathBuf {
        if self.data_dir.is_absolute() {
            self.data_dir.clone()
        } else {
            config.workspace.join(&self.data_dir)
        }
    }
}
