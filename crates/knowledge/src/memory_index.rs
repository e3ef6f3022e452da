//! In-process vector index.
//!
//! Brute-force cosine search over a `Vec`. Used by tests and by small
//! datasets where a LanceDB directory is unnecessary.

use crate::types::RetrievedDocument;
use crate::vector_index::{cosine_distance, IndexRecord, VectorIndex};
use nyaya_core::AppResult;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryIndex {
    records: RwLock<Vec<IndexRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<IndexRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryIndex {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn get_exact(
        &self,
        doc_type: &str,
        section_number: &str,
    ) -> AppResult<Vec<RetrievedDocument>> {
        let records = self.records.read().await;
        let mut hits: Vec<&IndexRecord> = records
            .iter()
            .filter(|r| r.metadata.doc_type == doc_type && r.metadata.section_number == section_number)
            .collect();
        hits.sort_by_key(|r| r.metadata.chunk_index());

        Ok(hits
            .into_iter()
            .map(|r| RetrievedDocument::exact(r.text.clone(), r.metadata.clone()))
            .collect())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> AppResult<Vec<RetrievedDocument>> {
        let records = self.records.read().await;
        let mut scored: Vec<RetrievedDocument> = records
            .iter()
            .map(|r| {
                RetrievedDocument::new(
                    r.text.clone(),
                    r.metadata.clone(),
                    cosine_distance(embedding, &r.embedding),
                )
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
    }

    async fn upsert(&self, records: &[IndexRecord]) -> AppResult<()> {
        let mut stored = self.records.write().await;
        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.records.read().await.len())
    }

    async fn reset(&self) -> AppResult<()> {
        self.records.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;

    fn record(id: &str, doc_type: &str, section: &str, chunk: u64, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.to_string(),
            text: format!("{} text", id),
            metadata: DocumentMetadata::new(doc_type, section).with("chunk_index", chunk),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_query_orders_by_ascending_distance() {
        let index = InMemoryIndex::with_records(vec![
            record("ipc_1_0", "ipc", "1", 0, vec![0.0, 1.0]),
            record("ipc_2_0", "ipc", "2", 0, vec![1.0, 0.0]),
            record("ipc_3_0", "ipc", "3", 0, vec![0.7, 0.7]),
        ]);

        let results = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].metadata.section_number, "2");
        assert_eq!(results[1].metadata.section_number, "3");
        assert!(results[0].distance <= results[1].distance);
    }

    #[tokio::test]
    async fn test_get_exact_sorted_by_chunk() {
        let index = InMemoryIndex::with_records(vec![
            record("ipc_420_1", "ipc", "420", 1, vec![1.0]),
            record("crpc_420_0", "crpc", "420", 0, vec![1.0]),
            record("ipc_420_0", "ipc", "420", 0, vec![1.0]),
        ]);

        let hits = index.get_exact("ipc", "420").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "ipc_420_0 text");
        assert!(hits.iter().all(|d| d.is_exact()));
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_id() {
        let index = InMemoryIndex::new();
        index
            .upsert(&[record("ipc_1_0", "ipc", "1", 0, vec![1.0])])
            .await
            .unwrap();
        let mut updated = record("ipc_1_0", "ipc", "1", 0, vec![1.0]);
        updated.text = "amended".to_string();
        index.upsert(&[updated]).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let hits = index.get_exact("ipc", "1").await.unwrap();
        assert_eq!(hits[0].content, "amended");

        index.reset().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
