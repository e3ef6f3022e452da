//! Statute indexer: JSON section records to embedded index rows.
//!
//! Each data file holds one act, named by its stem (`ipc.json`,
//! `crpc.json`, ...). Ids are `{act}_{section}_{chunk}`, so re-indexing the
//! same input replaces rows instead of duplicating them.

use crate::chunker::{chunk_text, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::embeddings::EmbeddingProvider;
use crate::types::{ActType, DocumentMetadata};
use crate::vector_index::{IndexRecord, VectorIndex};
use nyaya_core::{AppError, AppResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

const DEFAULT_SOURCE: &str = "IndianKanoon.org";

/// Rows embedded and written per round trip.
const BATCH_SIZE: usize = 100;

/// One scraped statute section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatuteRecord {
    #[serde(default, deserialize_with = "scalar_string")]
    pub section_number: Option<String>,
    #[serde(default)]
    pub section_title: String,
    #[serde(default)]
    pub section_text: String,
    #[serde(default)]
    pub explanations: Vec<String>,
    #[serde(default)]
    pub illustrations: Vec<String>,
    #[serde(default)]
    pub act: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Section numbers arrive as strings or bare integers.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl StatuteRecord {
    /// Searchable text for one section, in the layout the prompt context expects.
    pub fn document_text(&self, doc_type: &str) -> String {
        let act = ActType::parse(doc_type);
        let abbreviation = act
            .map(|a| a.abbreviation().to_string())
            .unwrap_or_else(|| doc_type.to_uppercase());

        let mut parts = vec![format!(
            "Source: {}",
            self.source.as_deref().unwrap_or(DEFAULT_SOURCE)
        )];

        let act_name = match (&self.act, act) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(act)) => act.long_name().to_string(),
            _ => doc_type.to_uppercase(),
        };
        parts.push(format!("Act: {}", act_name));

        if let Some(section) = &self.section_number {
            parts.push(format!("{} Section {}", abbreviation, section));
        }
        if !self.section_title.is_empty() {
            parts.push(format!("Title: {}", self.section_title));
        }
        if !self.section_text.is_empty() {
            parts.push(format!("\nContent:\n{}", self.section_text));
        }

        push_numbered(&mut parts, "Explanations", &self.explanations);
        push_numbered(&mut parts, "Illustrations", &self.illustrations);

        parts.join("\n")
    }
}

fn push_numbered(parts: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.iter().all(|i| i.trim().is_empty()) {
        return;
    }
    parts.push(format!("\n{}:", heading));
    for (i, item) in items.iter().enumerate() {
        if !item.trim().is_empty() {
            parts.push(format!("{}. {}", i + 1, item));
        }
    }
}

/// A chunk ready to embed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedChunk {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Chunk every record of one act and attach ids and metadata.
///
/// Records without a section number fall back to their position in the file.
pub fn prepare_chunks(
    doc_type: &str,
    records: &[StatuteRecord],
    chunk_size: usize,
    overlap: usize,
) -> Vec<PreparedChunk> {
    let mut prepared = Vec::new();

    for (position, record) in records.iter().enumerate() {
        let section = record
            .section_number
            .clone()
            .unwrap_or_else(|| position.to_string());
        let chunks = chunk_text(&record.document_text(doc_type), chunk_size, overlap);
        let total = chunks.len();

        for (chunk_index, text) in chunks.into_iter().enumerate() {
            let mut metadata = DocumentMetadata::new(doc_type, section.clone())
                .with("source", record.source.as_deref().unwrap_or(DEFAULT_SOURCE))
                .with("chunk_index", chunk_index)
                .with("total_chunks", total);
            for (key, value) in [
                ("section_title", Some(record.section_title.as_str())),
                ("url", record.url.as_deref()),
                ("act", record.act.as_deref()),
            ] {
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    metadata = metadata.with(key, value);
                }
            }

            prepared.push(PreparedChunk {
                id: format!("{}_{}_{}", doc_type, section, chunk_index),
                text,
                metadata,
            });
        }
    }

    prepared
}

/// Totals reported by an indexing run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub files: usize,
    pub sections: usize,
    pub chunks: usize,
    pub skipped_files: usize,
    pub duration_secs: f64,
}

pub struct StatuteIndexer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    chunk_size: usize,
    overlap: usize,
}

impl StatuteIndexer {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.overlap = overlap;
        self
    }

    /// Embed and upsert the records of one act. Returns the chunk count.
    pub async fn index_records(&self, doc_type: &str, records: &[StatuteRecord]) -> AppResult<usize> {
        let prepared = prepare_chunks(doc_type, records, self.chunk_size, self.overlap);
        tracing::info!(
            "Prepared {} chunks from {} {} sections",
            prepared.len(),
            records.len(),
            doc_type
        );

        for batch in prepared.chunks(BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(AppError::Knowledge(format!(
                    "Embedding provider returned {} vectors for {} chunks",
                    embeddings.len(),
                    batch.len()
                )));
            }

            let records: Vec<IndexRecord> = batch
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| IndexRecord {
                    id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    metadata: chunk.metadata.clone(),
                    embedding,
                })
                .collect();
            self.index.upsert(&records).await?;
        }

        Ok(prepared.len())
    }

    /// Index one JSON file. The act defaults to the file stem.
    pub async fn index_file(&self, path: &Path, doc_type: Option<&str>) -> AppResult<(usize, usize)> {
        let doc_type = match doc_type {
            Some(t) => t.to_lowercase(),
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_lowercase)
                .ok_or_else(|| {
                    AppError::Knowledge(format!("Cannot derive act from {}", path.display()))
                })?,
        };

        let raw = std::fs::read_to_string(path)?;
        let records: Vec<StatuteRecord> = serde_json::from_str(&raw).map_err(|e| {
            AppError::Knowledge(format!("Invalid statute file {}: {}", path.display(), e))
        })?;

        if records.is_empty() {
            tracing::warn!("No sections in {}", path.display());
            return Ok((0, 0));
        }

        let chunks = self.index_records(&doc_type, &records).await?;
        tracing::info!("Indexed {} chunks from {}", chunks, path.display());
        Ok((records.len(), chunks))
    }

    /// Index every `*.json` file under `dir`.
    ///
    /// A file that fails to parse or embed is skipped and counted; the run
    /// continues with the next file.
    pub async fn index_dir(&self, dir: &Path) -> AppResult<IndexStats> {
        if !dir.is_dir() {
            return Err(AppError::Knowledge(format!(
                "Data directory not found: {}",
                dir.display()
            )));
        }

        let start = Instant::now();
        let mut stats = IndexStats::default();

        let mut files: Vec<_> = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        files.sort();

        for path in files {
            match self.index_file(&path, None).await {
                Ok((sections, chunks)) => {
                    stats.files += 1;
                    stats.sections += sections;
                    stats.chunks += chunks;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    stats.skipped_files += 1;
                }
            }
        }

        stats.duration_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            "Indexing complete: {} chunks from {} sections in {} files ({} skipped) in {:.2}s",
            stats.chunks,
            stats.sections,
            stats.files,
            stats.skipped_files,
            stats.duration_secs
        );

        Ok(stats)
    }
}
