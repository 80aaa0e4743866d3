//! CLI 모듈
//!
//! ragcheck CLI 명령어 정의 및 구현

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::cases::{default_cases, load_cases};
use crate::config::RagConfig;
use crate::engine::AnswerEngine;
use crate::judge::{CaseOutcome, CaseResult, JudgeHarness, SuiteReport};
use crate::knowledge::{LanceVectorStore, VectorStore};
use crate::provider::{has_api_key, ModelSpec, Provider};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "ragcheck")]
#[command(version, about = "로컬 RAG 질의 + LLM 판정 평가", long_about = None)]
pub struct Cli {
    /// 설정 파일 경로 (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 질문에 답변 (검색 컨텍스트 기반)
    Query {
        /// 질문
        question: String,

        /// 검색할 청크 수 (top-K)
        #[arg(short, long)]
        k: Option<usize>,

        /// 검색된 청크와 스코어 출력
        #[arg(short, long)]
        verbose: bool,
    },

    /// 평가 케이스 실행 (LLM 판정)
    Eval {
        /// 케이스 JSON 파일 (없으면 내장 케이스)
        #[arg(short, long)]
        cases: Option<PathBuf>,

        /// 동시 실행 케이스 수
        #[arg(long, default_value = "1")]
        concurrency: usize,

        /// 결과를 JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = RagConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;

    match cli.command {
        Commands::Query {
            question,
            k,
            verbose,
        } => {
            if let Some(k) = k {
                config.k = k;
                config.validate()?;
            }
            cmd_query(&config, &question, verbose).await
        }
        Commands::Eval {
            cases,
            concurrency,
            json,
        } => cmd_eval(&config, cases, concurrency, json).await,
        Commands::Status => cmd_status(&config).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 질의 명령어 (query)
async fn cmd_query(config: &RagConfig, question: &str, verbose: bool) -> Result<()> {
    ensure_api_key(config)?;

    let engine = AnswerEngine::from_config(config)
        .await
        .context("AnswerEngine 초기화 실패")?;

    let (answer, chunks) = engine
        .answer_with_chunks(question)
        .await
        .context("답변 생성 실패")?;

    if verbose {
        println!("[*] 검색된 청크 ({} 건, k={}):\n", chunks.len(), engine.k());
        for (i, chunk) in chunks.iter().enumerate() {
            println!("{}. [점수: {:.4}] {}", i + 1, chunk.score, chunk.source_id);
            println!("   내용: {}", truncate_text(&chunk.text, 200));
        }
        println!();
    }

    println!("Response: {}", answer.text);
    if answer.sources.is_empty() {
        println!("Sources: (없음)");
    } else {
        println!("Sources: {:?}", answer.sources);
    }

    Ok(())
}

/// 평가 명령어 (eval)
///
/// 실패하거나 에러가 난 케이스가 있으면 에러를 반환합니다 (non-zero exit).
async fn cmd_eval(
    config: &RagConfig,
    cases: Option<PathBuf>,
    concurrency: usize,
    json: bool,
) -> Result<()> {
    ensure_api_key(config)?;

    let cases = match cases {
        Some(path) => load_cases(&path)?,
        None => default_cases(),
    };

    let harness = JudgeHarness::from_config(config)
        .await
        .context("JudgeHarness 초기화 실패")?;

    if !json {
        println!(
            "[*] {} 케이스 실행 중 (생성: {}, 판정: {}, k={})\n",
            cases.len(),
            config.generation_model,
            config.judge_model,
            harness.engine().k()
        );
    }

    let report = harness.run_suite(&cases, concurrency).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("리포트 직렬화 실패")?
        );
    } else {
        print_report(&report);
    }

    if !report.all_passed() {
        bail!(
            "{} 케이스 중 실패 {}, 에러 {}",
            report.results.len(),
            report.failed(),
            report.errored()
        );
    }

    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(config: &RagConfig) -> Result<()> {
    println!("ragcheck v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", config.data_dir.display());
    println!("[*] 임베딩 모델: {}", config.embedding_model);
    println!("[*] 생성 모델: {}", config.generation_model);
    println!("[*] 판정 모델: {}", config.judge_model);
    println!("[*] top-K: {}", config.k);

    if uses_gemini(config) {
        if has_api_key() {
            println!("[OK] API 키: 설정됨");
        } else {
            println!("[!] API 키: 미설정");
            println!("    설정: export GEMINI_API_KEY=your-key");
        }
    }

    match LanceVectorStore::open(&config.vectors_path(), config.embedding_dimension).await {
        Ok(store) => match store.count().await {
            Ok(count) => println!("[OK] 벡터 인덱스: {} 청크", count),
            Err(e) => println!("[!] 벡터 통계 조회 실패: {}", e),
        },
        Err(e) => println!("[!] 벡터 저장소 열기 실패: {}", e),
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn print_report(report: &SuiteReport) {
    for (i, result) in report.results.iter().enumerate() {
        print_case(i + 1, result);
    }

    println!(
        "[*] 결과: 통과 {}, 실패 {}, 에러 {}",
        report.passed(),
        report.failed(),
        report.errored()
    );
}

fn print_case(index: usize, result: &CaseResult) {
    let tag = match result.outcome() {
        CaseOutcome::Passed => "[OK]",
        CaseOutcome::Failed => "[FAIL]",
        CaseOutcome::Errored => "[ERROR]",
    };

    println!("{}. {} {}", index, tag, result.question);
    println!("   기대: {}", result.expected);
    if let Some(ref actual) = result.actual {
        println!("   실제: {}", truncate_text(actual, 200));
    }
    if let Some(verdict) = result.verdict {
        println!("   판정: {}", verdict);
    }
    if let Some(ref error) = result.error {
        println!("   에러: {}", error);
    }
    println!("   ({} ms)", result.elapsed_ms);
    println!();
}

/// 설정된 모델 중 Gemini가 있는지
fn uses_gemini(config: &RagConfig) -> bool {
    [
        &config.embedding_model,
        &config.generation_model,
        &config.judge_model,
    ]
    .iter()
    .any(|spec| {
        ModelSpec::parse(spec)
            .map(|s| s.provider == Provider::Gemini)
            .unwrap_or(false)
    })
}

fn ensure_api_key(config: &RagConfig) -> Result<()> {
    if uses_gemini(config) && !has_api_key() {
        bail!(
            "API 키가 설정되지 않았습니다.\n\
             설정: export GEMINI_API_KEY=your-key"
        );
    }
    Ok(())
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_uses_gemini() {
        let mut config = RagConfig::default();
        assert!(!uses_gemini(&config));

        config.judge_model = "gemini:gemini-2.0-flash".to_string();
        assert!(uses_gemini(&config));
    }

    #[test]
    fn test_parse_eval_args() {
        let cli = Cli::try_parse_from([
            "ragcheck",
            "eval",
            "--cases",
            "cases.json",
            "--concurrency",
            "4",
            "--config",
            "cfg.json",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("cfg.json")));
        match cli.command {
            Commands::Eval {
                cases,
                concurrency,
                json,
            } => {
                assert_eq!(cases, Some(PathBuf::from("cases.json")));
                assert_eq!(concurrency, 4);
                assert!(!json);
            }
            _ => panic!("expected eval command"),
        }
    }

    #[test]
    fn test_parse_query_args() {
        let cli = Cli::try_parse_from(["ragcheck", "query", "What is 1+1?", "-k", "3", "-v"]).unwrap();
        match cli.command {
            Commands::Query {
                question,
                k,
                verbose,
            } => {
                assert_eq!(question, "What is 1+1?");
                assert_eq!(k, Some(3));
                assert!(verbose);
            }
            _ => panic!("expected query command"),
        }
    }
}
