//! 프로바이더 선택 - 모델 이름 문자열 파싱 및 API 키 관리
//!
//! `"gemini:gemini-2.0-flash"` → Gemini
//! `"ollama:mistral"`, `"mistral"` → Ollama (로컬)

use std::fmt;

use anyhow::Result;

use crate::error::RagError;

// ============================================================================
// ModelSpec
// ============================================================================

/// 모델 프로바이더
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// 로컬 Ollama 서버
    Ollama,
    /// Google Gemini API
    Gemini,
}

/// 파싱된 모델 지정 문자열
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: Provider,
    pub model: String,
}

impl ModelSpec {
    /// 모델 이름 문자열 파싱
    ///
    /// 알려진 접두사(`ollama:`, `gemini:`)만 프로바이더로 해석합니다.
    /// `deepseek-r1:7b`처럼 태그에 콜론이 있는 Ollama 모델은 그대로 모델 이름이 됩니다.
    pub fn parse(spec: &str) -> std::result::Result<Self, RagError> {
        let spec = spec.trim();

        let (provider, model) = if let Some(model) = spec.strip_prefix("gemini:") {
            (Provider::Gemini, model)
        } else if let Some(model) = spec.strip_prefix("ollama:") {
            (Provider::Ollama, model)
        } else {
            (Provider::Ollama, spec)
        };

        if model.trim().is_empty() {
            return Err(RagError::Config(format!("Empty model name in '{}'", spec)));
        }

        Ok(Self {
            provider,
            model: model.trim().to_string(),
        })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.provider {
            Provider::Ollama => write!(f, "ollama:{}", self.model),
            Provider::Gemini => write!(f, "gemini:{}", self.model),
        }
    }
}

// ============================================================================
// API Key Management
// ============================================================================

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"];

/// 조회 함수로 API 키 탐색 (빈 값은 무시)
///
/// 찾은 변수 이름과 값을 반환합니다.
fn find_api_key<F>(lookup: F) -> Option<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .find_map(|&var| lookup(var).filter(|key| !key.is_empty()).map(|key| (var, key)))
}

fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Gemini API 키 로드 (환경변수에서)
///
/// 우선순위:
/// 1. `GEMINI_API_KEY` 환경변수
/// 2. `GOOGLE_AI_API_KEY` 환경변수
pub fn get_api_key() -> Result<String> {
    match find_api_key(env_lookup) {
        Some((var, key)) => {
            tracing::debug!("Using API key from {}", var);
            Ok(key)
        }
        None => anyhow::bail!(
            "API key not found. Set GEMINI_API_KEY or GOOGLE_AI_API_KEY environment variable.\n\
             Get your API key at: https://aistudio.google.com/app/apikey"
        ),
    }
}

/// API 키 존재 여부 확인
pub fn has_api_key() -> bool {
    find_api_key(env_lookup).is_some()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixes() {
        let spec = ModelSpec::parse("gemini:gemini-2.0-flash").unwrap();
        assert_eq!(spec.provider, Provider::Gemini);
        assert_eq!(spec.model, "gemini-2.0-flash");

        let spec = ModelSpec::parse("ollama:mistral").unwrap();
        assert_eq!(spec.provider, Provider::Ollama);
        assert_eq!(spec.model, "mistral");
    }

    #[test]
    fn test_parse_bare_name_with_tag() {
        let spec = ModelSpec::parse("deepseek-r1:7b").unwrap();
        assert_eq!(spec.provider, Provider::Ollama);
        assert_eq!(spec.model, "deepseek-r1:7b");

        let spec = ModelSpec::parse("ollama:deepseek-r1:7b").unwrap();
        assert_eq!(spec.model, "deepseek-r1:7b");
    }

    #[test]
    fn test_parse_empty() {
        assert!(ModelSpec::parse("").is_err());
        assert!(ModelSpec::parse("gemini:").is_err());
    }

    #[test]
    fn test_display_roundtrip_prefix() {
        let spec = ModelSpec::parse("nomic-embed-text").unwrap();
        assert_eq!(spec.to_string(), "ollama:nomic-embed-text");
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| {
            vars.iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_find_api_key_priority() {
        let found = find_api_key(lookup(&[
            ("GOOGLE_AI_API_KEY", "google-key"),
            ("GEMINI_API_KEY", "gemini-key"),
        ]));
        assert_eq!(found, Some(("GEMINI_API_KEY", "gemini-key".to_string())));

        let found = find_api_key(lookup(&[("GOOGLE_AI_API_KEY", "google-key")]));
        assert_eq!(found, Some(("GOOGLE_AI_API_KEY", "google-key".to_string())));
    }

    #[test]
    fn test_find_api_key_skips_empty() {
        let found = find_api_key(lookup(&[
            ("GEMINI_API_KEY", ""),
            ("GOOGLE_AI_API_KEY", "google-key"),
        ]));
        assert_eq!(found, Some(("GOOGLE_AI_API_KEY", "google-key".to_string())));

        assert_eq!(find_api_key(lookup(&[("GEMINI_API_KEY", "")])), None);
        assert_eq!(find_api_key(lookup(&[])), None);
    }
}
