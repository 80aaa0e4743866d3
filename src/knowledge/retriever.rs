//! 청크 검색기 - 질문 텍스트 → top-K 청크
//!
//! 임베딩 프로바이더와 벡터 저장소를 묶어
//! `search(query_text, k)` 계약을 제공합니다.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;

use super::vector::{RetrievedChunk, VectorStore};

/// 텍스트 질의 기반 청크 검색
///
/// 결과는 관련도 내림차순입니다. 같은 스냅샷과 k에 대해
/// 어떤 청크가 선택되는지는 (동점 처리를 제외하고) 결정적입니다.
#[async_trait]
pub trait ChunkRetriever: Send + Sync {
    async fn search(&self, query_text: &str, k: usize) -> Result<Vec<RetrievedChunk>>;
}

/// 임베딩 + 벡터 저장소 검색기
pub struct EmbeddingRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl EmbeddingRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl ChunkRetriever for EmbeddingRetriever {
    async fn search(&self, query_text: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let query_embedding = self
            .embedder
            .embed(query_text)
            .await
            .with_context(|| format!("Failed to embed query with {}", self.embedder.name()))?;

        let chunks = self
            .store
            .search(&query_embedding, k)
            .await
            .context("Vector search failed")?;

        tracing::debug!("Retrieved {} chunk(s) (k={})", chunks.len(), k);
        Ok(chunks)
    }
}
