//! 인메모리 벡터 저장소
//!
//! 전수 코사인 유사도 검색. 테스트와 소규모 스냅샷용입니다.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::vector::{cosine_similarity, sort_by_score, RetrievedChunk, VectorEntry, VectorStore};

/// 인메모리 벡터 저장소
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    entries: RwLock<Vec<VectorEntry>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 엔트리로 초기화
    pub fn with_entries(entries: Vec<VectorEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }
}

fn check_dimensions(entries: &[VectorEntry], expected: usize) -> Result<()> {
    if let Some(bad) = entries.iter().find(|e| e.embedding.len() != expected) {
        anyhow::bail!(
            "Embedding for {} has {} dimensions, expected {}",
            bad.source_id,
            bad.embedding.len(),
            expected
        );
    }
    Ok(())
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn insert_batch(&self, entries: &[VectorEntry]) -> Result<usize> {
        let mut guard = self.entries.write().await;

        // 기존 엔트리(없으면 배치 첫 엔트리)의 차원을 기준으로 검사
        if let Some(expected) = guard.first().or(entries.first()).map(|e| e.embedding.len()) {
            check_dimensions(entries, expected)?;
        }

        guard.extend_from_slice(entries);
        Ok(entries.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<RetrievedChunk>> {
        let guard = self.entries.read().await;
        check_dimensions(&guard, query_embedding.len())?;

        let mut results: Vec<RetrievedChunk> = guard
            .iter()
            .map(|entry| RetrievedChunk {
                text: entry.text.clone(),
                source_id: entry.source_id.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        sort_by_score(&mut results);
        results.truncate(limit);
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}
