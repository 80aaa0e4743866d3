//! ragcheck - 로컬 RAG 질의 + LLM 판정 평가
//!
//! 질문을 임베딩해 벡터 스냅샷에서 관련 청크를 찾고,
//! 그 컨텍스트만으로 LLM이 답하게 합니다.
//! 평가 하네스는 두 번째 LLM으로 기대 답변과의 일치를 true/false 판정합니다.

pub mod cases;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod judge;
pub mod knowledge;
pub mod llm;
pub mod prompt;
pub mod provider;

#[cfg(test)]
mod test_support;

// Re-exports
pub use cases::{default_cases, load_cases, EvalCase};
pub use config::{get_data_dir, RagConfig};
pub use embedding::{create_embedder, EmbeddingProvider, GeminiEmbedding, OllamaEmbedding};
pub use engine::{build_context, Answer, AnswerEngine};
pub use error::{RagError, Result};
pub use judge::{parse_verdict, CaseOutcome, CaseResult, JudgeHarness, SuiteReport, Verdict};
pub use knowledge::{
    ChunkRetriever, EmbeddingRetriever, LanceVectorStore, MemoryVectorStore, RetrievedChunk,
    VectorEntry, VectorStore,
};
pub use llm::{create_llm, GeminiLlm, LanguageModel, OllamaLlm};
pub use prompt::{Context, PromptBuilder};
pub use provider::{get_api_key, has_api_key, ModelSpec, Provider};
