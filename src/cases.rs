//! 평가 케이스 - (질문, 기대 답변) 목록

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 평가 케이스
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    pub question: String,
    pub expected_response: String,
}

impl EvalCase {
    pub fn new(question: &str, expected_response: &str) -> Self {
        Self {
            question: question.to_string(),
            expected_response: expected_response.to_string(),
        }
    }
}

/// 기본 내장 케이스
pub fn default_cases() -> Vec<EvalCase> {
    vec![
        EvalCase::new("What is 1+1? (Answer with the number only)", "2"),
        EvalCase::new(
            "What color paint do you get if you mix yellow and blue paint? (Answer with one word only)",
            "green",
        ),
    ]
}

/// JSON 배열 파일에서 케이스 로드
///
/// ```json
/// [{ "question": "...", "expected_response": "..." }]
/// ```
pub fn load_cases(path: &Path) -> Result<Vec<EvalCase>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cases file: {}", path.display()))?;
    let cases: Vec<EvalCase> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse cases file: {}", path.display()))?;

    if cases.is_empty() {
        anyhow::bail!("Cases file is empty: {}", path.display());
    }

    Ok(cases)
}
