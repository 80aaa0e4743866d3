//! 설정 모듈 - 모델 이름, top-K, 프롬프트 템플릿
//!
//! 우선순위 (낮음 → 높음):
//! 1. 기본값
//! 2. JSON 설정 파일 (`~/.ragcheck/config.json` 또는 `--config`)
//! 3. 환경변수 (`RAGCHECK_*`)
//! 4. CLI 플래그 (cli 모듈에서 적용)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::RagError;
use crate::prompt::{DEFAULT_ANSWER_TEMPLATE, DEFAULT_JUDGE_TEMPLATE};

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_EMBEDDING_MODEL: &str = "ollama:nomic-embed-text";
pub const DEFAULT_GENERATION_MODEL: &str = "ollama:mistral";
pub const DEFAULT_JUDGE_MODEL: &str = "ollama:deepseek-r1:7b";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// 기본 검색 청크 수
pub const DEFAULT_TOP_K: usize = 5;

/// 기본 임베딩 차원 (nomic-embed-text, gemini-embedding-001 공통)
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;

const CONFIG_FILE_NAME: &str = "config.json";

/// 데이터 디렉토리 경로 (~/.ragcheck/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ragcheck")
}

// ============================================================================
// RagConfig
// ============================================================================

/// 파이프라인 설정
///
/// 프로바이더는 모델 이름 문자열로 선택합니다.
/// `gemini:<model>`은 Gemini, `ollama:<model>` 또는 접두사 없는 이름은 Ollama.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub embedding_model: String,
    pub generation_model: String,
    pub judge_model: String,
    /// 검색할 청크 수 (top-K)
    pub k: usize,
    pub prompt_template_answer: String,
    pub prompt_template_judge: String,
    pub ollama_url: String,
    pub data_dir: PathBuf,
    pub embedding_dimension: usize,
    /// HTTP 요청 타임아웃 (초). 코어는 자체 타임아웃을 두지 않습니다.
    pub request_timeout_secs: u64,
    /// Gemini 임베딩 429 응답 시 재시도 횟수
    pub embedding_max_retries: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            judge_model: DEFAULT_JUDGE_MODEL.to_string(),
            k: DEFAULT_TOP_K,
            prompt_template_answer: DEFAULT_ANSWER_TEMPLATE.to_string(),
            prompt_template_judge: DEFAULT_JUDGE_TEMPLATE.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            data_dir: get_data_dir(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            request_timeout_secs: 120,
            embedding_max_retries: 3,
        }
    }
}

impl RagConfig {
    /// 설정 로드 (기본값 → 파일 → 환경변수)
    ///
    /// `path`가 없으면 데이터 디렉토리의 config.json을 찾고,
    /// 그것도 없으면 기본값을 사용합니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = get_data_dir().join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// JSON 파일에서 읽기 (누락된 필드는 기본값)
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// 환경변수 오버라이드 적용
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("RAGCHECK_EMBEDDING_MODEL") {
            self.embedding_model = v;
        }
        if let Some(v) = get("RAGCHECK_GENERATION_MODEL") {
            self.generation_model = v;
        }
        if let Some(v) = get("RAGCHECK_JUDGE_MODEL") {
            self.judge_model = v;
        }
        if let Some(v) = get("RAGCHECK_OLLAMA_URL") {
            self.ollama_url = v;
        }
        if let Some(v) = get("RAGCHECK_K") {
            self.k = v
                .trim()
                .parse()
                .map_err(|_| RagError::Config(format!("RAGCHECK_K is not a number: {v}")))?;
        }

        Ok(())
    }

    /// 설정 검증
    pub fn validate(&self) -> std::result::Result<(), RagError> {
        if self.k == 0 {
            return Err(RagError::Config("k must be at least 1".to_string()));
        }

        for (name, value) in [
            ("embedding_model", &self.embedding_model),
            ("generation_model", &self.generation_model),
            ("judge_model", &self.judge_model),
        ] {
            if value.trim().is_empty() {
                return Err(RagError::Config(format!("{name} must not be empty")));
            }
        }

        if self.embedding_dimension == 0 {
            return Err(RagError::Config(
                "embedding_dimension must be at least 1".to_string(),
            ));
        }

        // 템플릿 플레이스홀더 검증은 PromptBuilder가 담당
        crate::prompt::PromptBuilder::new(
            &self.prompt_template_answer,
            &self.prompt_template_judge,
        )?;

        Ok(())
    }

    /// LanceDB 경로
    pub fn vectors_path(&self) -> PathBuf {
        self.data_dir.join("vectors.lance")
    }
}

// ============================================================================
// Tests
// ============================================================================
