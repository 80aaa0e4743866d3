//! Gemini 임베딩 - Google Gemini API
//!
//! source: https://ai.google.dev/gemini-api/docs/embeddings

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check_dimension, EmbeddingProvider};

/// Gemini embedContent 엔드포인트 (모델 이름은 경로에 삽입)
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// gemini-embedding-001이 지원하는 차원 (MRL)
const SUPPORTED_DIMENSIONS: [usize; 3] = [768, 1536, 3072];

/// 재시도 시 초기 백오프 (ms)
const INITIAL_BACKOFF_MS: u64 = 2000;

/// 백오프 상한 (ms)
const MAX_BACKOFF_MS: u64 = 60_000;

/// Google Gemini 임베딩 구현체
///
/// 429 응답에만 지수 백오프로 재시도합니다. 그 외 에러는 즉시 실패.
#[derive(Debug)]
pub struct GeminiEmbedding {
    api_key: String,
    client: reqwest::Client,
    model: String,
    name: String,
    dimension: usize,
    timeout: Duration,
    max_retries: u32,
}

/// Gemini API 요청 본문
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest {
    model: String,
    content: EmbedContent,
    task_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Debug, Serialize)]
struct EmbedPart {
    text: String,
}

/// Gemini API 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Gemini API 에러 응답
#[derive(Debug, Deserialize)]
pub(crate) struct GeminiError {
    pub(crate) error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiErrorDetail {
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) status: String,
}

impl GeminiEmbedding {
    /// 차원을 지정하여 생성
    ///
    /// # Arguments
    /// * `api_key` - Google AI API 키
    /// * `model` - 임베딩 모델 (예: gemini-embedding-001)
    /// * `dimension` - 임베딩 차원 (768, 1536, 3072 중 선택)
    /// * `timeout` - 요청 타임아웃
    pub fn with_dimension(
        api_key: String,
        model: &str,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self> {
        if !SUPPORTED_DIMENSIONS.contains(&dimension) {
            anyhow::bail!(
                "Invalid dimension: {}. Must be 768, 1536, or 3072",
                dimension
            );
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            client,
            model: model.to_string(),
            name: format!("gemini:{}", model),
            dimension,
            timeout,
            max_retries: 3,
        })
    }

    /// 429 재시도 횟수 지정
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// HTTP 요청 타임아웃
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:embedContent", GEMINI_BASE_URL, self.model)
    }

    fn request(&self, text: &str) -> EmbedRequest {
        EmbedRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_string(),
                }],
            },
            // 질문 임베딩 전용
            task_type: "RETRIEVAL_QUERY",
            output_dimensionality: Some(self.dimension),
        }
    }
}

/// 지수 백오프 (MAX_BACKOFF_MS에서 멈춤)
fn backoff_delay(attempt: u32) -> Duration {
    let millis = 2u64
        .checked_pow(attempt)
        .and_then(|factor| factor.checked_mul(INITIAL_BACKOFF_MS))
        .map_or(MAX_BACKOFF_MS, |ms| ms.min(MAX_BACKOFF_MS));
    Duration::from_millis(millis)
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = self.request(text);
        let endpoint = self.endpoint();

        for attempt in 0..=self.max_retries {
            // API 키는 URL이 아닌 헤더로 전송
            let response = self
                .client
                .post(&endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&request)
                .send()
                .await
                .context("Failed to send embedding request")?;

            let status = response.status();
            let body = response
                .text()
                .await
                .context("Failed to read response body")?;

            if status.is_success() {
                let parsed: EmbedResponse =
                    serde_json::from_str(&body).context("Failed to parse embedding response")?;
                check_dimension(&self.name, self.dimension, &parsed.embedding.values)?;
                return Ok(parsed.embedding.values);
            }

            if status.as_u16() == 429 && attempt < self.max_retries {
                let backoff = backoff_delay(attempt);
                tracing::warn!(
                    "Rate limit hit (429), backing off {:?} (attempt {}/{})",
                    backoff,
                    attempt + 1,
                    self.max_retries
                );
                tokio::time::sleep(backoff).await;
                continue;
            }

            if let Ok(error) = serde_json::from_str::<GeminiError>(&body) {
                anyhow::bail!(
                    "Gemini API error ({}): {}",
                    error.error.status,
                    error.error.message
                );
            }
            anyhow::bail!("Gemini API error ({}): {}", status, body);
        }

        anyhow::bail!("Embedding failed after {} retries", self.max_retries)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.name
    }
}
