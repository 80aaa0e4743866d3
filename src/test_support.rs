//! 테스트용 가짜 협력자

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::knowledge::{ChunkRetriever, RetrievedChunk};
use crate::llm::LanguageModel;

/// 프롬프트를 기록하고 정해진 규칙으로 응답하는 LLM
pub struct ScriptedLlm {
    name: String,
    respond: Box<dyn Fn(&str) -> Result<String> + Send + Sync>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new<F>(name: &str, respond: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 항상 같은 텍스트를 반환
    pub fn fixed(name: &str, reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(name, move |_| Ok(reply.clone()))
    }

    /// 항상 실패
    pub fn failing(name: &str, message: &str) -> Self {
        let message = message.to_string();
        Self::new(name, move |_| Err(anyhow::anyhow!(message.clone())))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 고정된 청크 목록을 반환하는 검색기
pub struct StaticRetriever {
    chunks: Vec<RetrievedChunk>,
    fail: bool,
}

impl StaticRetriever {
    pub fn new(chunks: Vec<RetrievedChunk>) -> Self {
        Self { chunks, fail: false }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn failing() -> Self {
        Self {
            chunks: vec![],
            fail: true,
        }
    }
}

#[async_trait]
impl ChunkRetriever for StaticRetriever {
    async fn search(&self, _query_text: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.fail {
            anyhow::bail!("vector store unreachable");
        }
        Ok(self.chunks.iter().take(k).cloned().collect())
    }
}

pub fn chunk(source_id: &str, text: &str, score: f32) -> RetrievedChunk {
    RetrievedChunk {
        text: text.to_string(),
        source_id: source_id.to_string(),
        score,
    }
}
