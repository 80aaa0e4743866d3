//! Gemini 생성 모델 클라이언트
//!
//! source: https://ai.google.dev/api/generate-content

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::embedding::GeminiError;

use super::LanguageModel;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini `generateContent` 클라이언트
#[derive(Debug)]
pub struct GeminiLlm {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiLlm {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            client,
            endpoint: format!("{}/{}:generateContent", GEMINI_BASE_URL, model),
            name: format!("gemini:{}", model),
        })
    }
}

impl GenerateResponse {
    /// 첫 번째 후보의 텍스트 파트를 이어붙임
    fn into_text(self) -> Result<String> {
        let content = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| anyhow::anyhow!("Gemini response contained no candidates"))?;

        Ok(content.parts.into_iter().map(|p| p.text).collect())
    }
}

#[async_trait]
impl LanguageModel for GeminiLlm {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        tracing::debug!("POST {} (prompt={} chars)", self.endpoint, prompt.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send generate request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<GeminiError>(&body) {
                anyhow::bail!(
                    "Gemini API error ({}): {}",
                    error.error.status,
                    error.error.message
                );
            }
            anyhow::bail!("Gemini API error ({}): {}", status, body);
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).context("Failed to parse generate response")?;
        parsed.into_text()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
