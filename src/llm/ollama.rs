//! Ollama 생성 모델 클라이언트
//!
//! ref: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-completion

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::LanguageModel;

/// Ollama `/api/generate` 클라이언트 (스트리밍 없음)
#[derive(Debug)]
pub struct OllamaLlm {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

impl OllamaLlm {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_string(),
            name: format!("ollama:{}", model),
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaLlm {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        tracing::debug!("POST {} (model={}, prompt={} chars)", self.endpoint, self.model, prompt.len());

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
            if let Ok(error) = serde_json::from_str::<OllamaError>(&body) {
                anyhow::bail!("Ollama error ({}): {}", status, error.error);
            }
            anyhow::bail!("Ollama error ({}): {}", status, body);
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).context("Failed to parse generate response")?;
        Ok(parsed.response)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_disables_streaming() {
        let request = GenerateRequest {
            model: "mistral",
            prompt: "hi",
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["model"], "mistral");
    }

    #[test]
    fn test_response_parsing_keeps_whitespace() {
        let body = r#"{"model":"mistral","response":" 2\n","done":true}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.response, " 2\n");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_error() {
        let llm = OllamaLlm::new("http://127.0.0.1:9", "mistral", Duration::from_millis(500)).unwrap();
        let err = llm.invoke("hello").await.unwrap_err();
        assert!(err.to_string().contains("Failed to reach Ollama"));
    }
}
