//! AnswerEngine - 검색 기반 답변 파이프라인
//!
//! 질문 → 임베딩/검색 → 컨텍스트 → 프롬프트 → LLM → 답변
//!
//! 검색 결과가 없어도 실패하지 않고 빈 컨텍스트로 진행합니다.
//! 검색/생성 에러는 재시도 없이 호출자에게 전파됩니다.

use std::sync::Arc;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::config::RagConfig;
use crate::embedding::create_embedder;
use crate::error::{RagError, Result};
use crate::knowledge::{ChunkRetriever, EmbeddingRetriever, LanceVectorStore, RetrievedChunk};
use crate::llm::{create_llm, LanguageModel};
use crate::prompt::{Context, PromptBuilder};

// ============================================================================
// Types
// ============================================================================

/// 질문 하나에 대한 답변
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// LLM 원본 출력 (trim 하지 않음)
    pub text: String,
    /// 검색 순위 순서의 청크 식별자 (중복 제거 없음)
    pub sources: Vec<String>,
}

// ============================================================================
// AnswerEngine
// ============================================================================

/// 답변 엔진
///
/// 상태를 공유하지 않으므로 여러 질문을 동시에 처리해도 안전합니다.
pub struct AnswerEngine {
    retriever: Arc<dyn ChunkRetriever>,
    llm: Arc<dyn LanguageModel>,
    prompts: PromptBuilder,
    k: usize,
}

impl AnswerEngine {
    /// 협력자를 직접 주입하여 생성
    pub fn new(
        retriever: Arc<dyn ChunkRetriever>,
        llm: Arc<dyn LanguageModel>,
        prompts: PromptBuilder,
        k: usize,
    ) -> Self {
        Self {
            retriever,
            llm,
            prompts,
            k,
        }
    }

    /// 설정으로부터 생성 (LanceDB 스냅샷 + 설정된 임베딩/생성 모델)
    pub async fn from_config(config: &RagConfig) -> anyhow::Result<Self> {
        let embedder = create_embedder(config)?;
        let store = LanceVectorStore::open(&config.vectors_path(), config.embedding_dimension)
            .await
            .context("Failed to open vector store")?;
        let retriever = EmbeddingRetriever::new(embedder, Arc::new(store));

        let llm = create_llm(&config.generation_model, config)?;
        let prompts =
            PromptBuilder::new(&config.prompt_template_answer, &config.prompt_template_judge)?;

        Ok(Self::new(Arc::new(retriever), llm, prompts, config.k))
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// 질문에 답변
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let (answer, _) = self.answer_with_chunks(question).await?;
        Ok(answer)
    }

    /// 질문에 답변하고 검색된 청크(스코어 포함)도 함께 반환
    pub async fn answer_with_chunks(
        &self,
        question: &str,
    ) -> Result<(Answer, Vec<RetrievedChunk>)> {
        let chunks = self
            .retriever
            .search(question, self.k)
            .await
            .map_err(RagError::Retrieval)?;

        if chunks.is_empty() {
            tracing::info!("No context found for question, answering with empty context");
        }

        let context = build_context(&chunks);
        let prompt = self.prompts.build_answer_prompt(&context, question);

        let text = self
            .llm
            .invoke(&prompt)
            .await
            .map_err(|source| RagError::Generation {
                model: self.llm.name().to_string(),
                source,
            })?;

        let sources = chunks.iter().map(|c| c.source_id.clone()).collect();

        Ok((Answer { text, sources }, chunks))
    }
}

/// 검색 순위 순서 그대로 컨텍스트 구성
pub fn build_context(chunks: &[RetrievedChunk]) -> Context {
    chunks.iter().map(|c| c.text.as_str()).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::EMPTY_CONTEXT_NOTICE;
    use crate::test_support::{chunk, ScriptedLlm, StaticRetriever};

    fn engine(retriever: StaticRetriever, llm: Arc<ScriptedLlm>) -> AnswerEngine {
        AnswerEngine::new(Arc::new(retriever), llm, PromptBuilder::default(), 5)
    }

    #[tokio::test]
    async fn test_answer_with_context() {
        let llm = Arc::new(ScriptedLlm::fixed("gen", " 2\n"));
        let retriever = StaticRetriever::new(vec![
            chunk("math.pdf:1:0", "One plus one equals two.", 0.9),
            chunk("math.pdf:3:1", "Arithmetic basics.", 0.5),
        ]);

        let answer = engine(retriever, llm.clone())
            .answer("What is 1+1? (Answer with the number only)")
            .await
            .unwrap();

        // 원본 출력 유지
        assert_eq!(answer.text, " 2\n");
        assert_eq!(answer.sources, vec!["math.pdf:1:0", "math.pdf:3:1"]);

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("One plus one equals two.\n\n---\n\nArithmetic basics."));
        assert!(prompts[0].contains("What is 1+1? (Answer with the number only)"));
    }

    #[test]
    fn test_engine_keeps_configured_k() {
        let llm = Arc::new(ScriptedLlm::fixed("gen", "ok"));
        let engine = AnswerEngine::new(
            Arc::new(StaticRetriever::empty()),
            llm,
            PromptBuilder::default(),
            3,
        );
        assert_eq!(engine.k(), 3);
    }

    #[tokio::test]
    async fn test_context_order_follows_rank() {
        let llm = Arc::new(ScriptedLlm::fixed("gen", "ok"));
        let retriever = StaticRetriever::new(vec![
            chunk("c1", "C1 text", 0.9),
            chunk("c2", "C2 text", 0.5),
        ]);

        engine(retriever, llm.clone()).answer("q").await.unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.find("C1 text").unwrap() < prompt.find("C2 text").unwrap());
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_safe() {
        let llm = Arc::new(ScriptedLlm::fixed("gen", "I don't know."));

        let answer = engine(StaticRetriever::empty(), llm.clone())
            .answer("Anything?")
            .await
            .unwrap();

        assert!(answer.sources.is_empty());
        assert_eq!(answer.text, "I don't know.");
        assert!(llm.prompts()[0].contains(EMPTY_CONTEXT_NOTICE));
    }

    #[tokio::test]
    async fn test_duplicate_sources_not_deduplicated() {
        let llm = Arc::new(ScriptedLlm::fixed("gen", "x"));
        let retriever = StaticRetriever::new(vec![
            chunk("doc:1:0", "a", 0.8),
            chunk("doc:1:0", "a", 0.8),
        ]);

        let answer = engine(retriever, llm).answer("q").await.unwrap();
        assert_eq!(answer.sources, vec!["doc:1:0", "doc:1:0"]);
    }

    #[tokio::test]
    async fn test_k_limits_retrieval() {
        let llm = Arc::new(ScriptedLlm::fixed("gen", "x"));
        let retriever = StaticRetriever::new(vec![
            chunk("a", "a", 0.9),
            chunk("b", "b", 0.8),
            chunk("c", "c", 0.7),
        ]);
        let engine = AnswerEngine::new(Arc::new(retriever), llm, PromptBuilder::default(), 2);

        let (answer, chunks) = engine.answer_with_chunks("q").await.unwrap();
        assert_eq!(answer.sources, vec!["a", "b"]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].score, 0.9);
    }

    #[tokio::test]
    async fn test_retrieval_error_propagates() {
        let llm = Arc::new(ScriptedLlm::fixed("gen", "x"));
        let err = engine(StaticRetriever::failing(), llm.clone())
            .answer("q")
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::Retrieval(_)));
        // 검색 실패 시 LLM 호출 없음
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_generation_error_carries_cause() {
        let llm = Arc::new(ScriptedLlm::failing("ollama:mistral", "rate limited"));
        let err = engine(StaticRetriever::empty(), llm)
            .answer("q")
            .await
            .unwrap_err();

        match err {
            RagError::Generation { model, source } => {
                assert_eq!(model, "ollama:mistral");
                assert!(source.to_string().contains("rate limited"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_build_context() {
        let context = build_context(&[chunk("a", "first", 0.9), chunk("b", "second", 0.1)]);
        assert_eq!(context.len(), 2);
        assert_eq!(context.chunks()[0], "first");
    }
}
