//! JudgeHarness - LLM 판정 기반 답변 평가
//!
//! 케이스마다 LLM을 두 번 호출합니다 (답변 생성 → 판정).
//! 판정 출력은 trim + 소문자화 후 "true"/"false" 부분 문자열로 해석하며,
//! 둘 다 있으면 먼저 나온 쪽을 따릅니다. 둘 다 없으면 에러이고
//! 절대 기본값으로 대체하지 않습니다.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::cases::EvalCase;
use crate::config::RagConfig;
use crate::engine::AnswerEngine;
use crate::error::{RagError, Result};
use crate::llm::{create_llm, LanguageModel};

// ============================================================================
// Verdict
// ============================================================================

/// 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    True,
    False,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::True => f.write_str("true"),
            Verdict::False => f.write_str("false"),
        }
    }
}

/// 판정 LLM 출력 해석 (순수 함수)
pub fn parse_verdict(raw: &str) -> Result<Verdict> {
    let cleaned = raw.trim().to_lowercase();

    match (cleaned.find("true"), cleaned.find("false")) {
        (Some(t), Some(f)) if t < f => Ok(Verdict::True),
        (Some(_), Some(_)) => Ok(Verdict::False),
        (Some(_), None) => Ok(Verdict::True),
        (None, Some(_)) => Ok(Verdict::False),
        (None, None) => Err(RagError::AmbiguousVerdict { output: cleaned }),
    }
}

// ============================================================================
// Case Results
// ============================================================================

/// 케이스 결과 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseOutcome {
    Passed,
    Failed,
    Errored,
}

/// 케이스 하나의 평가 결과 (렌더링은 호출자가 결정)
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub question: String,
    pub expected: String,
    /// 생성된 답변 (생성 실패 시 None)
    pub actual: Option<String>,
    pub sources: Vec<String>,
    /// 판정 (에러 시 None)
    pub verdict: Option<Verdict>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl CaseResult {
    pub fn outcome(&self) -> CaseOutcome {
        match (self.verdict, &self.error) {
            (_, Some(_)) => CaseOutcome::Errored,
            (Some(Verdict::True), None) => CaseOutcome::Passed,
            _ => CaseOutcome::Failed,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome() == CaseOutcome::Passed
    }
}

/// 평가 실행 리포트
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub results: Vec<CaseResult>,
}

impl SuiteReport {
    fn count(&self, outcome: CaseOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome() == outcome).count()
    }

    pub fn passed(&self) -> usize {
        self.count(CaseOutcome::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(CaseOutcome::Failed)
    }

    pub fn errored(&self) -> usize {
        self.count(CaseOutcome::Errored)
    }

    /// 모든 케이스 통과 여부 (에러도 실패로 취급)
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(CaseResult::passed)
    }
}

// ============================================================================
// JudgeHarness
// ============================================================================

/// 판정 하네스
///
/// 케이스 사이에 공유 상태가 없으므로 순서와 무관하게 병렬 실행할 수 있습니다.
pub struct JudgeHarness {
    engine: Arc<AnswerEngine>,
    judge_llm: Arc<dyn LanguageModel>,
}

impl JudgeHarness {
    /// 판정 프롬프트는 엔진의 PromptBuilder를 공유합니다.
    pub fn new(engine: Arc<AnswerEngine>, judge_llm: Arc<dyn LanguageModel>) -> Self {
        Self { engine, judge_llm }
    }

    /// 설정으로부터 생성 (judge_model 사용)
    pub async fn from_config(config: &RagConfig) -> anyhow::Result<Self> {
        let engine = AnswerEngine::from_config(config).await?;
        let judge_llm = create_llm(&config.judge_model, config)?;
        Ok(Self::new(Arc::new(engine), judge_llm))
    }

    pub fn engine(&self) -> &AnswerEngine {
        &self.engine
    }

    /// 기대 답변과 실제 답변 비교 판정
    pub async fn judge(&self, expected: &str, actual: &str) -> Result<Verdict> {
        let prompt = self.engine.prompts().build_judge_prompt(expected, actual);
        tracing::debug!("Evaluation prompt:\n{}", prompt);

        let raw = self
            .judge_llm
            .invoke(&prompt)
            .await
            .map_err(|source| RagError::Generation {
                model: self.judge_llm.name().to_string(),
                source,
            })?;

        let verdict = parse_verdict(&raw)?;
        tracing::debug!("Judge output {:?} -> {}", raw.trim(), verdict);
        Ok(verdict)
    }

    /// 질문 하나 실행: 답변 후 판정. Verdict::True일 때만 true.
    pub async fn run_case(&self, question: &str, expected_response: &str) -> Result<bool> {
        let answer = self.engine.answer(question).await?;
        let verdict = self.judge(expected_response, &answer.text).await?;
        Ok(verdict == Verdict::True)
    }

    /// 에러를 전파하지 않고 결과 객체로 기록
    pub async fn evaluate_case(&self, case: &EvalCase) -> CaseResult {
        let started = Instant::now();
        let mut result = CaseResult {
            question: case.question.clone(),
            expected: case.expected_response.clone(),
            actual: None,
            sources: vec![],
            verdict: None,
            error: None,
            elapsed_ms: 0,
        };

        match self.engine.answer(&case.question).await {
            Ok(answer) => {
                match self.judge(&case.expected_response, &answer.text).await {
                    Ok(verdict) => result.verdict = Some(verdict),
                    Err(e) => result.error = Some(e.to_string()),
                }
                result.actual = Some(answer.text);
                result.sources = answer.sources;
            }
            Err(e) => result.error = Some(e.to_string()),
        }

        result.elapsed_ms = started.elapsed().as_millis() as u64;

        match result.outcome() {
            CaseOutcome::Passed => tracing::info!("PASS: {}", case.question),
            CaseOutcome::Failed => tracing::info!("FAIL: {}", case.question),
            CaseOutcome::Errored => tracing::warn!(
                "ERROR: {} ({})",
                case.question,
                result.error.as_deref().unwrap_or_default()
            ),
        }

        result
    }

    /// 여러 케이스 실행
    ///
    /// 최대 `concurrency`개를 동시에 실행하며, 결과는 입력 순서를 따릅니다.
    /// 한 케이스의 에러는 다른 케이스에 영향을 주지 않습니다.
    pub async fn run_suite(&self, cases: &[EvalCase], concurrency: usize) -> SuiteReport {
        let started_at = Utc::now();

        let results = futures::stream::iter(cases.iter().map(|case| self.evaluate_case(case)))
            .buffered(concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        SuiteReport {
            started_at,
            results,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
