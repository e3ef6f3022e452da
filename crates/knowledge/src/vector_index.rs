//! Vector index abstraction.
//!
//! Backends store statute chunks with their embeddings and answer two kinds
//! of lookups: structured (`type` + `section_number`) and nearest-neighbor.

use crate::types::{DocumentMetadata, RetrievedDocument};
use nyaya_core::AppResult;

/// One row of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    /// Stable id, `{act}_{section}_{chunk}`
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
    pub embedding: Vec<f32>,
}

/// Trait for vector index backends.
///
/// Handles are opened once per process and shared behind an `Arc`, so every
/// method takes `&self`.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name for logs and `health`.
    fn backend(&self) -> &str;

    /// All chunks whose metadata matches `doc_type` and `section_number`.
    ///
    /// Returned documents carry the exact-match distance `0.0`, ordered by
    /// chunk index.
    async fn get_exact(
        &self,
        doc_type: &str,
        section_number: &str,
    ) -> AppResult<Vec<RetrievedDocument>>;

    /// The `k` nearest chunks by cosine distance, ascending.
    async fn query(&self, embedding: &[f32], k: usize) -> AppResult<Vec<RetrievedDocument>>;

    /// Insert records, replacing any existing rows with the same id.
    async fn upsert(&self, records: &[IndexRecord]) -> AppResult<()>;

    /// Number of stored chunks.
    async fn count(&self) -> AppResult<usize>;

    /// Remove every stored chunk.
    async fn reset(&self) -> AppResult<()>;
}

/// Cosine distance (`1 - cosine similarity`). Zero-length vectors are
/// maximally distant.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 1.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_distance(&[1.0], &[1.0, 0.0]), 1.0);
    }
}
