//! 임베딩 모듈 - 질문 텍스트 벡터화
//!
//! 로컬 Ollama 모델 또는 Gemini API 중 하나를 설정으로 선택합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = create_embedder(&config)?;
//! let embedding = embedder.embed("What is 1+1?").await?;
//! ```

mod gemini;
mod ollama;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::RagConfig;
use crate::provider::{get_api_key, ModelSpec, Provider};

pub use gemini::GeminiEmbedding;
pub(crate) use gemini::GeminiError;
pub use ollama::OllamaEmbedding;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 같은 입력과 모델 버전에 대해 결정적이며, 인스턴스마다 차원이 고정됩니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Factory Function
// ============================================================================

/// 설정의 `embedding_model`로 임베딩 프로바이더 생성
pub fn create_embedder(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let spec = ModelSpec::parse(&config.embedding_model)?;
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let embedder: Arc<dyn EmbeddingProvider> = match spec.provider {
        Provider::Ollama => Arc::new(OllamaEmbedding::new(
            &config.ollama_url,
            &spec.model,
            config.embedding_dimension,
            timeout,
        )?),
        Provider::Gemini => {
            let api_key = get_api_key().context("Gemini embedding requires an API key")?;
            let embedder = GeminiEmbedding::with_dimension(
                api_key,
                &spec.model,
                config.embedding_dimension,
                timeout,
            )?;
            Arc::new(embedder.with_max_retries(config.embedding_max_retries))
        }
    };

    tracing::info!(
        "Using {} embedding (dimension: {})",
        embedder.name(),
        embedder.dimension()
    );
    Ok(embedder)
}

/// 응답 벡터 차원 확인
fn check_dimension(name: &str, expected: usize, embedding: &[f32]) -> Result<()> {
    if embedding.len() != expected {
        anyhow::bail!(
            "{} returned {} dimensions, expected {}",
            name,
            embedding.len(),
            expected
        );
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
