//! LanceDB Vector Store - 디스크 기반 벡터 스냅샷
//!
//! 외부에서 채워진 `chunks` 테이블을 ANN 검색합니다.
//! ref: https://lancedb.github.io/lancedb/

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};

use super::vector::{sort_by_score, RetrievedChunk, VectorEntry, VectorStore};

/// 청크 테이블 이름
const TABLE_NAME: &str = "chunks";

// ============================================================================
// LanceVectorStore
// ============================================================================

/// LanceDB 벡터 저장소 구현
///
/// 스키마: `id` (Utf8), `text` (Utf8), `embedding` (FixedSizeList<Float32>)
pub struct LanceVectorStore {
    db: Connection,
    dimension: i32,
}

impl LanceVectorStore {
    /// LanceDB 저장소 열기
    ///
    /// # Arguments
    /// * `path` - .lance 디렉토리 경로
    /// * `dimension` - 임베딩 차원
    pub async fn open(path: &Path, dimension: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create LanceDB directory")?;
            }
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?;

        let dimension = i32::try_from(dimension).context("Embedding dimension too large")?;

        let db = lancedb::connect(path_str)
            .execute()
            .await
            .context("Failed to connect to LanceDB")?;

        Ok(Self { db, dimension })
    }

    fn create_schema(&self) -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dimension,
                ),
                false,
            ),
        ])
    }

    /// 엔트리들을 Arrow RecordBatch로 변환
    fn entries_to_batch(&self, entries: &[VectorEntry]) -> Result<RecordBatch> {
        if let Some(bad) = entries
            .iter()
            .find(|e| e.embedding.len() != self.dimension as usize)
        {
            anyhow::bail!(
                "Embedding for {} has {} dimensions, expected {}",
                bad.source_id,
                bad.embedding.len(),
                self.dimension
            );
        }

        let ids: Vec<&str> = entries.iter().map(|e| e.source_id.as_str()).collect();
        let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
        let flat: Vec<f32> = entries
            .iter()
            .flat_map(|e| e.embedding.iter().copied())
            .collect();

        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let embeddings = FixedSizeListArray::try_new(
            field,
            self.dimension,
            Arc::new(Float32Array::from(flat)) as Arc<dyn Array>,
            None,
        )
        .context("Failed to create embedding array")?;

        RecordBatch::try_new(
            Arc::new(self.create_schema()),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(embeddings),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    async fn table_exists(&self) -> Result<bool> {
        let names = self
            .db
            .table_names()
            .execute()
            .await
            .context("Failed to list LanceDB tables")?;
        Ok(names.iter().any(|n| n == TABLE_NAME))
    }

    async fn open_table(&self) -> Result<Option<lancedb::table::Table>> {
        if !self.table_exists().await? {
            return Ok(None);
        }

        let table = self
            .db
            .open_table(TABLE_NAME)
            .execute()
            .await
            .context("Failed to open chunks table")?;
        Ok(Some(table))
    }
}

/// 배치에서 검색 결과 추출
fn batch_to_chunks(batch: &RecordBatch) -> Result<Vec<RetrievedChunk>> {
    let ids = batch
        .column_by_name("id")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow::anyhow!("Missing id column"))?;

    let texts = batch
        .column_by_name("text")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow::anyhow!("Missing text column"))?;

    // _distance 컬럼 (LanceDB가 자동 추가)
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| anyhow::anyhow!("Missing _distance column"))?;

    Ok((0..batch.num_rows())
        .map(|i| RetrievedChunk {
            text: texts.value(i).to_string(),
            source_id: ids.value(i).to_string(),
            // 거리 → 관련도 (0.0 ~ 1.0, 높을수록 관련)
            score: 1.0 / (1.0 + distances.value(i)),
        })
        .collect())
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn insert_batch(&self, entries: &[VectorEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let batch = self.entries_to_batch(entries)?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

        match self.open_table().await? {
            Some(table) => {
                table
                    .add(batches)
                    .execute()
                    .await
                    .context("Failed to add vectors to table")?;
            }
            None => {
                self.db
                    .create_table(TABLE_NAME, batches)
                    .execute()
                    .await
                    .context("Failed to create table")?;
            }
        }

        Ok(entries.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<RetrievedChunk>> {
        let Some(table) = self.open_table().await? else {
            tracing::debug!("No {} table yet, returning empty result", TABLE_NAME);
            return Ok(vec![]);
        };

        let stream = table
            .vector_search(query_embedding.to_vec())
            .context("Failed to create vector search")?
            .limit(limit)
            .execute()
            .await
            .context("Failed to execute vector search")?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to read search results")?;

        let mut results = Vec::new();
        for batch in &batches {
            results.extend(batch_to_chunks(batch)?);
        }

        sort_by_score(&mut results);
        results.truncate(limit);
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        match self.open_table().await? {
            Some(table) => table.count_rows(None).await.context("Failed to count rows"),
            None => Ok(0),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DIM: usize = 8;

    fn create_test_entry(id: &str, value: f32) -> VectorEntry {
        let mut embedding = vec![0.0; DIM];
        embedding[0] = value;
        embedding[1] = 1.0;
        VectorEntry {
            source_id: id.to_string(),
            text: format!("Test chunk {}", id),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_lance_store_basic() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("test.lance"), DIM)
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 0);

        let entries = vec![create_test_entry("a:0:0", 0.1), create_test_entry("a:0:1", 0.2)];
        assert_eq!(store.insert_batch(&entries).await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_lance_search_empty_table() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("empty.lance"), DIM)
            .await
            .unwrap();

        let results = store.search(&vec![0.1; DIM], 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_lance_search_ranked() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("search.lance"), DIM)
            .await
            .unwrap();

        store
            .insert_batch(&[
                create_test_entry("far", 9.0),
                create_test_entry("near", 1.0),
                create_test_entry("mid", 4.0),
            ])
            .await
            .unwrap();

        let results = store.search(&create_test_entry("q", 1.0).embedding, 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source_id, "near");
        assert_eq!(results[0].text, "Test chunk near");
        assert_eq!(results[1].source_id, "mid");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_lance_rejects_wrong_dimension() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("dim.lance"), DIM)
            .await
            .unwrap();

        let entry = VectorEntry {
            source_id: "x".to_string(),
            text: "x".to_string(),
            embedding: vec![0.1; DIM + 1],
        };
        assert!(store.insert_batch(&[entry]).await.is_err());
    }
}
