//! LLM 모듈 - 답변 생성 및 판정 모델 클라이언트
//!
//! 생성 모델과 판정 모델은 같은 인터페이스를 사용하며
//! 서로 다른 모델/프로바이더로 설정할 수 있습니다.

mod gemini;
mod ollama;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::RagConfig;
use crate::provider::{get_api_key, ModelSpec, Provider};

pub use gemini::GeminiLlm;
pub use ollama::OllamaLlm;

// ============================================================================
// LanguageModel Trait
// ============================================================================

/// 텍스트 생성 모델
///
/// 재시도는 하지 않습니다. 타임아웃은 HTTP 클라이언트 설정으로 제어합니다.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 프롬프트를 보내고 원본 응답 텍스트를 반환
    async fn invoke(&self, prompt: &str) -> Result<String>;

    /// 모델 이름 (`provider:model`)
    fn name(&self) -> &str;
}

// ============================================================================
// Factory Function
// ============================================================================

/// 모델 지정 문자열로 LLM 클라이언트 생성
pub fn create_llm(spec: &str, config: &RagConfig) -> Result<Arc<dyn LanguageModel>> {
    let spec = ModelSpec::parse(spec)?;
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let llm: Arc<dyn LanguageModel> = match spec.provider {
        Provider::Ollama => Arc::new(OllamaLlm::new(&config.ollama_url, &spec.model, timeout)?),
        Provider::Gemini => {
            let api_key = get_api_key().context("Gemini model requires an API key")?;
            Arc::new(GeminiLlm::new(api_key, &spec.model, timeout)?)
        }
    };

    tracing::debug!("Created LLM client: {}", llm.name());
    Ok(llm)
}
