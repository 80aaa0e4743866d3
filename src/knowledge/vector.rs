//! Vector Store - 벡터 검색 트레이트 및 유틸리티
//!
//! 저장소 채우기(ingestion)는 외부에서 수행됩니다.
//! 이 크레이트는 검색과 상태 조회만 사용합니다.

use std::cmp::Ordering;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// 벡터 엔트리 (저장용)
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// 청크 식별자 (예: `data/monopoly.pdf:6:2`)
    pub source_id: String,
    /// 청크 텍스트
    pub text: String,
    /// 임베딩 벡터
    pub embedding: Vec<f32>,
}

/// 검색된 청크
///
/// 검색 후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// 청크 텍스트
    pub text: String,
    /// 청크 식별자 (불투명 문자열)
    pub source_id: String,
    /// 관련도 스코어 (높을수록 관련)
    pub score: f32,
}

// ============================================================================
// VectorStore Trait
// ============================================================================

/// VectorStore 트레이트 (async)
///
/// 동시 읽기 검색을 지원해야 합니다.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// 벡터 배치 삽입
    async fn insert_batch(&self, entries: &[VectorEntry]) -> Result<usize>;

    /// 벡터 검색 (스코어 내림차순)
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<RetrievedChunk>>;

    /// 벡터 개수 조회
    async fn count(&self) -> Result<usize>;
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 유사도 계산
///
/// 결과는 -1.0 ~ 1.0 범위입니다. 길이가 다르거나 영벡터면 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// 스코어 내림차순 안정 정렬 (동점은 기존 순서 유지)
pub fn sort_by_score(chunks: &mut [RetrievedChunk]) {
    chunks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

// ============================================================================
// Tests
// ============================================================================
