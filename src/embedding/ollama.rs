//! Ollama 임베딩 - 로컬 임베딩 모델 (nomic-embed-text 등)
//!
//! ref: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-embeddings

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check_dimension, EmbeddingProvider};

/// Ollama 임베딩 구현체
#[derive(Debug)]
pub struct OllamaEmbedding {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    name: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    /// 새 Ollama 임베딩 인스턴스 생성
    ///
    /// # Arguments
    /// * `base_url` - Ollama 서버 주소 (예: http://localhost:11434)
    /// * `model` - 임베딩 모델 이름
    /// * `dimension` - 모델의 출력 차원
    /// * `timeout` - 요청 타임아웃
    pub fn new(base_url: &str, model: &str, dimension: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            name: format!("ollama:{}", model),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingsRequest {
            model: &self.model,
            prompt: text,
        };

        tracing::debug!("POST {} (model={})", self.endpoint, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach Ollama at {}", self.endpoint))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            anyhow::bail!("Ollama embedding error ({}): {}", status, body);
        }

        let parsed: EmbeddingsResponse =
            serde_json::from_str(&body).context("Failed to parse embedding response")?;

        check_dimension(&self.name, self.dimension, &parsed.embedding)?;
        Ok(parsed.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.name
    }
}
