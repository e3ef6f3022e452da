//! Hybrid retrieval: structured exact lookup merged with semantic search.

use crate::analyzer::{extract_section_reference, search_text};
use crate::embeddings::EmbeddingProvider;
use crate::types::{RetrievedDocument, SectionReference};
use crate::vector_index::VectorIndex;
use nyaya_core::{AppError, AppResult};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Merges exact section hits with nearest-neighbor results.
///
/// Output order is all exact matches (distance 0.0) first, then semantic
/// matches by ascending distance, with no two candidates sharing a
/// `type_section` key.
#[derive(Clone)]
pub struct HybridRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    timeout: Duration,
}

impl HybridRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            timeout,
        }
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Retrieve up to `top_k` deduplicated candidates.
    ///
    /// Never fails: an embedding or search failure yields an empty set so the
    /// caller can fall back to web search.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Vec<RetrievedDocument> {
        let reference = extract_section_reference(query);

        match self.try_retrieve(query, reference.as_ref(), top_k).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Retrieval unavailable, continuing without candidates: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_retrieve(
        &self,
        query: &str,
        reference: Option<&SectionReference>,
        top_k: usize,
    ) -> AppResult<Vec<RetrievedDocument>> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::with_capacity(top_k);

        if let Some(reference) = reference {
            // A failed structured lookup only loses the exact hits
            match self.exact_hits(reference).await {
                Ok(hits) => {
                    for hit in hits {
                        if candidates.len() >= top_k {
                            break;
                        }
                        if seen.insert(hit.key()) {
                            candidates.push(hit);
                        }
                    }
                    tracing::info!(
                        act = %reference.act,
                        section = %reference.number,
                        exact_hits = candidates.len(),
                        "Exact section lookup"
                    );
                }
                Err(e) => tracing::warn!("Exact section lookup failed: {}", e),
            }
        }

        let remaining = top_k.saturating_sub(candidates.len());
        if remaining == 0 {
            return Ok(candidates);
        }

        let text = search_text(query, reference);
        let embedding = self
            .with_timeout("embedding", self.embedder.embed(&text))
            .await?;

        // Over-fetch by the exact count so duplicates can be dropped
        let fetch = remaining + candidates.len();
        let mut semantic = self
            .with_timeout("vector search", self.index.query(&embedding, fetch))
            .await?;
        semantic.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        for doc in semantic {
            if candidates.len() >= top_k {
                break;
            }
            if seen.insert(doc.key()) {
                candidates.push(doc);
            }
        }

        tracing::debug!("Retrieved {} candidates", candidates.len());
        Ok(candidates)
    }

    async fn exact_hits(&self, reference: &SectionReference) -> AppResult<Vec<RetrievedDocument>> {
        let hits = self
            .with_timeout(
                "exact lookup",
                self.index
                    .get_exact(reference.act.as_str(), &reference.number),
            )
            .await?;

        // Exact hits are a sentinel, not a measured score
        Ok(hits
            .into_iter()
            .map(|mut doc| {
                doc.distance = RetrievedDocument::EXACT_MATCH_DISTANCE;
                doc
            })
            .collect())
    }

    async fn with_timeout<T>(
        &self,
        what: &str,
        fut: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| {
                AppError::Retrieval(format!(
                    "{} timed out after {}s",
                    what,
                    self.timeout.as_secs()
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockProvider;
    use crate::memory_index::InMemoryIndex;
    use crate::types::DocumentMetadata;
    use crate::vector_index::IndexRecord;

    #[derive(Debug)]
    struct FixedEmbedder(Vec<f32>);

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn provider_name(&self) -> &str {
            "fixed"
        }
        fn model_name(&self) -> &str {
            "fixed"
        }
        fn dimensions(&self) -> usize {
            self.0.len()
        }
        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }
    }

    #[derive(Debug)]
    struct FailingEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        fn provider_name(&self) -> &str {
            "failing"
        }
        fn model_name(&self) -> &str {
            "failing"
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Err(AppError::Retrieval("model not loaded".to_string()))
        }
    }

    fn record(doc_type: &str, section: &str, chunk: u64, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: format!("{}_{}_{}", doc_type, section, chunk),
            text: format!("{} {} chunk {}", doc_type, section, chunk),
            metadata: DocumentMetadata::new(doc_type, section).with("chunk_index", chunk),
            embedding,
        }
    }

    fn index() -> Arc<dyn VectorIndex> {
        Arc::new(InMemoryIndex::with_records(vec![
            record("ipc", "420", 0, vec![0.0, 1.0]),
            record("ipc", "420", 1, vec![0.1, 1.0]),
            record("ipc", "415", 0, vec![1.0, 0.1]),
            record("ipc", "415", 1, vec![1.0, 0.2]),
            record("ipc", "406", 0, vec![0.9, 0.5]),
            record("crpc", "41", 0, vec![0.5, 0.5]),
        ]))
    }

    fn retriever(embedder: Arc<dyn EmbeddingProvider>) -> HybridRetriever {
        HybridRetriever::new(embedder, index(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_exact_match_first_then_semantic() {
        let retriever = retriever(Arc::new(FixedEmbedder(vec![1.0, 0.0])));
        let results = retriever.retrieve("Section 420 IPC", 3).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_exact());
        assert_eq!(results[0].key(), "ipc_420");
        assert_eq!(results[0].content, "ipc 420 chunk 0");
        assert_eq!(results[1].key(), "ipc_415");
        assert!(!results[1].is_exact());
        assert!(results[1].distance <= results[2].distance);
    }

    #[tokio::test]
    async fn test_no_duplicate_keys() {
        let retriever = retriever(Arc::new(FixedEmbedder(vec![0.0, 1.0])));
        let results = retriever.retrieve("IPC 420 cheating", 10).await;

        let keys: HashSet<String> = results.iter().map(|d| d.key()).collect();
        assert_eq!(keys.len(), results.len());
        // Semantic search also ranks 420 first; it must not reappear
        assert_eq!(results.iter().filter(|d| d.key() == "ipc_420").count(), 1);
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_semantic_only_without_reference() {
        let retriever = retriever(Arc::new(FixedEmbedder(vec![1.0, 0.0])));
        let results = retriever.retrieve("dishonest inducement", 3).await;

        // Both 415 chunks rank first; the second is dropped as a duplicate
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|d| !d.is_exact()));
        assert_eq!(results[0].key(), "ipc_415");
    }

    #[tokio::test]
    async fn test_embedding_failure_yields_empty_set() {
        let retriever = retriever(Arc::new(FailingEmbedder));
        assert!(retriever.retrieve("Section 420 IPC", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_exact_hits_fill_top_k_without_embedding() {
        // With top_k = 1 the exact hit fills the budget, so the embedder is never called
        let retriever = retriever(Arc::new(FailingEmbedder));
        let results = retriever.retrieve("IPC 420", 1).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_exact());
    }

    #[tokio::test]
    async fn test_with_mock_embeddings() {
        let embedder = Arc::new(MockProvider::new(64));
        let index = Arc::new(InMemoryIndex::new());
        let texts = [
            ("ipc", "379", "Punishment for theft of movable property"),
            ("cpc", "9", "Courts to try all civil suits unless barred"),
        ];
        let mut records = Vec::new();
        for (doc_type, section, text) in texts {
            records.push(IndexRecord {
                id: format!("{}_{}_0", doc_type, section),
                text: text.to_string(),
                metadata: DocumentMetadata::new(doc_type, section),
                embedding: embedder.embed(text).await.unwrap(),
            });
        }
        index.upsert(&records).await.unwrap();

        let retriever = HybridRetriever::new(embedder, index, Duration::from_secs(5));
        let results = retriever.retrieve("theft punishment", 1).await;
        assert_eq!(results[0].key(), "ipc_379");
    }
}
