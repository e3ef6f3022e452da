//! LanceDB-backed vector index.

use crate::types::{DocumentMetadata, RetrievedDocument};
use crate::vector_index::{IndexRecord, VectorIndex};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use nyaya_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

const VECTOR_COLUMN: &str = "vector";
const DISTANCE_COLUMN: &str = "_distance";

/// Statute chunks stored in a LanceDB table.
///
/// `doc_type` and `section_number` are stored as their own columns so exact
/// lookups are a plain filter; the complete metadata object rides along as
/// JSON.
pub struct LanceDbIndex {
    table: Table,
    embedding_dim: usize,
}

impl LanceDbIndex {
    /// Open an existing table.
    ///
    /// Fails with `IndexNotInitialized` when the directory or table is
    /// missing, so callers can refuse to serve before any request arrives.
    pub async fn open(db_path: &Path, table_name: &str, embedding_dim: usize) -> AppResult<Self> {
        if !db_path.exists() {
            return Err(AppError::IndexNotInitialized(format!(
                "no index at {}. Run 'nyaya index' first.",
                db_path.display()
            )));
        }

        let conn = connect(db_path).await?;
        if !table_exists(&conn, table_name).await? {
            return Err(AppError::IndexNotInitialized(format!(
                "collection '{}' does not exist in {}",
                table_name,
                db_path.display()
            )));
        }

        let table = conn
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to open table: {}", e)))?;

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    /// Open the table, creating the directory and an empty table if needed.
    pub async fn open_or_create(
        db_path: &Path,
        table_name: &str,
        embedding_dim: usize,
    ) -> AppResult<Self> {
        std::fs::create_dir_all(db_path).map_err(|e| {
            AppError::Knowledge(format!("Failed to create index directory: {}", e))
        })?;

        let conn = connect(db_path).await?;

        let table = if table_exists(&conn, table_name).await? {
            conn.open_table(table_name)
                .execute()
                .await
                .map_err(|e| AppError::Knowledge(format!("Failed to open table: {}", e)))?
        } else {
            let schema = Self::schema(embedding_dim);
            let empty = RecordBatch::new_empty(schema.clone());

            tracing::info!("Creating collection '{}'", table_name);
            conn.create_table(
                table_name,
                RecordBatchIterator::new(vec![Ok(empty)], schema),
            )
            .execute()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to create table: {}", e)))?
        };

        tracing::debug!("Initialized LanceDB index at {:?}", db_path);

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    fn schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("doc_type", DataType::Utf8, false),
            Field::new("section_number", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("metadata", DataType::Utf8, false),
            Field::new(
                VECTOR_COLUMN,
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }

    /// Convert records into one columnar batch.
    fn records_to_batch(&self, records: &[IndexRecord]) -> AppResult<RecordBatch> {
        let mut flat = Vec::with_capacity(records.len() * self.embedding_dim);
        let mut metadata_json = Vec::with_capacity(records.len());

        for record in records {
            if record.embedding.len() != self.embedding_dim {
                return Err(AppError::Knowledge(format!(
                    "Embedding dimension mismatch for '{}': expected {}, got {}",
                    record.id,
                    self.embedding_dim,
                    record.embedding.len()
                )));
            }
            flat.extend_from_slice(&record.embedding);
            metadata_json.push(serde_json::to_string(&record.metadata)?);
        }

        let ids = StringArray::from_iter_values(records.iter().map(|r| r.id.as_str()));
        let texts = StringArray::from_iter_values(records.iter().map(|r| r.text.as_str()));
        let types =
            StringArray::from_iter_values(records.iter().map(|r| r.metadata.doc_type.as_str()));
        let sections = StringArray::from_iter_values(
            records.iter().map(|r| r.metadata.section_number.as_str()),
        );
        let chunks = UInt32Array::from_iter_values(
            records.iter().map(|r| r.metadata.chunk_index() as u32),
        );
        let metadata = StringArray::from_iter_values(metadata_json.iter().map(String::as_str));

        let vectors = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding_dim as i32,
            Arc::new(Float32Array::from(flat)),
            None,
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to build vector column: {}", e)))?;

        RecordBatch::try_new(
            Self::schema(self.embedding_dim),
            vec![
                Arc::new(ids),
                Arc::new(texts),
                Arc::new(types),
                Arc::new(sections),
                Arc::new(chunks),
                Arc::new(metadata),
                Arc::new(vectors),
            ],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to create RecordBatch: {}", e)))
    }

    /// Read result rows back into documents.
    ///
    /// Rows whose metadata fails validation are skipped with a warning.
    fn batch_to_documents(
        batch: &RecordBatch,
        with_distance: bool,
    ) -> AppResult<Vec<(u32, RetrievedDocument)>> {
        let texts = string_column(batch, "text")?;
        let metadata = string_column(batch, "metadata")?;
        let chunks = batch
            .column_by_name("chunk_index")
            .and_then(|c| c.as_any().downcast_ref::<UInt32Array>());
        let distances = if with_distance {
            Some(
                batch
                    .column_by_name(DISTANCE_COLUMN)
                    .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                    .ok_or_else(|| {
                        AppError::Retrieval("search result has no distance column".to_string())
                    })?,
            )
        } else {
            None
        };

        let mut documents = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let parsed = match DocumentMetadata::from_json(metadata.value(row)) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!("Skipping index row {}: {}", row, e);
                    continue;
                }
            };

            let distance = distances
                .map(|d| d.value(row))
                .unwrap_or(RetrievedDocument::EXACT_MATCH_DISTANCE);
            let chunk = chunks.map(|c| c.value(row)).unwrap_or(0);

            documents.push((
                chunk,
                RetrievedDocument::new(texts.value(row), parsed, distance),
            ));
        }

        Ok(documents)
    }
}

async fn connect(db_path: &Path) -> AppResult<Connection> {
    let uri = db_path.to_string_lossy().to_string();
    lancedb::connect(&uri)
        .execute()
        .await
        .map_err(|e| AppError::Knowledge(format!("Failed to connect to LanceDB: {}", e)))
}

async fn table_exists(conn: &Connection, table_name: &str) -> AppResult<bool> {
    let names = conn
        .table_names()
        .execute()
        .await
        .map_err(|e| AppError::Knowledge(format!("Failed to list tables: {}", e)))?;
    Ok(names.iter().any(|n| n == table_name))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AppError::Retrieval(format!("Invalid '{}' column", name)))
}

/// Quote a value for a SQL filter literal.
fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    fn backend(&self) -> &str {
        "lancedb"
    }

    async fn get_exact(
        &self,
        doc_type: &str,
        section_number: &str,
    ) -> AppResult<Vec<RetrievedDocument>> {
        let filter = format!(
            "doc_type = {} AND section_number = {}",
            sql_literal(doc_type),
            sql_literal(section_number)
        );

        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .only_if(filter)
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Exact lookup failed: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to collect results: {}", e)))?;

        let mut hits = Vec::new();
        for batch in &batches {
            hits.extend(Self::batch_to_documents(batch, false)?);
        }
        hits.sort_by_key(|(chunk, _)| *chunk);

        Ok(hits.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> AppResult<Vec<RetrievedDocument>> {
        if embedding.len() != self.embedding_dim {
            return Err(AppError::Retrieval(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                embedding.len()
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .nearest_to(embedding.to_vec())
            .map_err(|e| AppError::Retrieval(format!("Failed to create query: {}", e)))?
            .column(VECTOR_COLUMN)
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Vector search failed: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to collect results: {}", e)))?;

        let mut documents = Vec::new();
        for batch in &batches {
            documents.extend(
                Self::batch_to_documents(batch, true)?
                    .into_iter()
                    .map(|(_, doc)| doc),
            );
        }
        documents.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        tracing::debug!(
            "Vector search returned {} rows (requested {})",
            documents.len(),
            k
        );
        Ok(documents)
    }

    async fn upsert(&self, records: &[IndexRecord]) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let batch = self.records_to_batch(records)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        let mut merge = self.table.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge
            .execute(Box::new(reader))
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to upsert chunks: {}", e)))?;

        tracing::debug!("Upserted {} chunks into LanceDB", records.len());
        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to count rows: {}", e)))
    }

    async fn reset(&self) -> AppResult<()> {
        if self.count().await? > 0 {
            self.table
                .delete("id IS NOT NULL")
                .await
                .map_err(|e| AppError::Knowledge(format!("Failed to reset index: {}", e)))?;
        }
        tracing::info!("Reset LanceDB index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(section: &str, chunk: u64, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: format!("ipc_{}_{}", section, chunk),
            text: format!("IPC Section {} chunk {}", section, chunk),
            metadata: DocumentMetadata::new("ipc", section)
                .with("chunk_index", chunk)
                .with("section_title", "Test"),
            embedding,
        }
    }

    #[test]
    fn test_sql_literal_escapes_quotes() {
        assert_eq!(sql_literal("420"), "'420'");
        assert_eq!(sql_literal("o'brien"), "'o''brien'");
    }

    #[tokio::test]
    async fn test_open_missing_is_not_initialized() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let err = LanceDbIndex::open(&missing, "indian_law_collection", 4)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::IndexNotInitialized(_)));
    }

    #[tokio::test]
    async fn test_upsert_query_and_exact() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index");
        let index = LanceDbIndex::open_or_create(&path, "laws", 4).await.unwrap();

        index
            .upsert(&[
                record("420", 1, vec![1.0, 0.0, 0.0, 0.0]),
                record("420", 0, vec![0.9, 0.1, 0.0, 0.0]),
                record("302", 0, vec![0.0, 1.0, 0.0, 0.0]),
            ])
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 3);

        let exact = index.get_exact("ipc", "420").await.unwrap();
        assert_eq!(exact.len(), 2);
        assert!(exact.iter().all(|d| d.is_exact()));
        assert_eq!(exact[0].metadata.chunk_index(), 0);

        let nearest = index.query(&[0.0, 1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(nearest.len(), 1);
        assert_eq!(nearest[0].metadata.section_number, "302");
        assert!(nearest[0].distance < 0.01);

        // Same ids replace rather than duplicate
        index
            .upsert(&[record("302", 0, vec![0.0, 0.0, 1.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 3);

        index.reset().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);

        // Reopening finds the existing table
        let reopened = LanceDbIndex::open(&path, "laws", 4).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 0);
    }
}
