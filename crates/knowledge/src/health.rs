//! Service health snapshot.

use crate::vector_index::VectorIndex;
use serde::Serialize;

pub const STATUS_HEALTHY: &str = "healthy";
pub const STATUS_UNAVAILABLE: &str = "unavailable";

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub collection: String,
    pub document_count: usize,
    pub embedding_model: String,
    pub llm_provider: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == STATUS_HEALTHY
    }

    /// Report for an index that could not be opened at all.
    pub fn unavailable(
        collection: &str,
        embedding_model: &str,
        llm_provider: &str,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status: STATUS_UNAVAILABLE.to_string(),
            collection: collection.to_string(),
            document_count: 0,
            embedding_model: embedding_model.to_string(),
            llm_provider: llm_provider.to_string(),
            error: Some(error.into()),
        }
    }
}

/// Count the indexed chunks. An empty or unreadable index is unavailable.
pub async fn check_health(
    index: &dyn VectorIndex,
    collection: &str,
    embedding_model: &str,
    llm_provider: &str,
) -> HealthReport {
    match index.count().await {
        Ok(0) => HealthReport::unavailable(
            collection,
            embedding_model,
            llm_provider,
            "index is empty; run `nyaya index` first",
        ),
        Ok(count) => HealthReport {
            status: STATUS_HEALTHY.to_string(),
            collection: collection.to_string(),
            document_count: count,
            embedding_model: embedding_model.to_string(),
            llm_provider: llm_provider.to_string(),
            error: None,
        },
        Err(e) => {
            tracing::warn!("Health check failed on {} index: {}", index.backend(), e);
            HealthReport::unavailable(collection, embedding_model, llm_provider, e.to_string())
        }
    }
}
