//! 에러 타입 - RAG 파이프라인 에러 분류
//!
//! 모든 에러는 호출자에게 그대로 전파됩니다.
//! 코어는 재시도나 부분 결과 대체를 하지 않습니다.

use thiserror::Error;

/// RAG 파이프라인 에러
#[derive(Error, Debug)]
pub enum RagError {
    /// 임베딩 프로바이더 또는 벡터 저장소 실패
    #[error("Retrieval failed: {0:#}")]
    Retrieval(#[source] anyhow::Error),

    /// LLM 호출 실패 (timeout, auth, rate limit 등)
    #[error("Generation failed ({model}): {source:#}")]
    Generation {
        model: String,
        #[source]
        source: anyhow::Error,
    },

    /// 판정 LLM 응답에서 true/false를 찾을 수 없음
    #[error("Ambiguous verdict: judge output contains neither 'true' nor 'false': {output:?}")]
    AmbiguousVerdict { output: String },

    /// 잘못된 설정 또는 프롬프트 템플릿
    #[error("Configuration error: {0}")]
    Config(String),
}

/// RAG 파이프라인 결과 타입
pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    /// 판정 불가 에러 여부
    pub fn is_ambiguous_verdict(&self) -> bool {
        matches!(self, RagError::AmbiguousVerdict { .. })
    }
}
