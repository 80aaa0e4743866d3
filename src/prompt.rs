//! PromptBuilder - 답변/판정 프롬프트 생성
//!
//! 템플릿은 `{name}` 형태의 플레이스홀더를 사용합니다.
//! 치환은 단일 패스로 수행되므로, 치환된 값(검색된 청크 등) 안에 있는
//! `{question}` 같은 문자열은 다시 치환되지 않습니다.

use crate::error::{RagError, Result};

// ============================================================================
// Templates
// ============================================================================

/// 기본 답변 프롬프트
pub const DEFAULT_ANSWER_TEMPLATE: &str = "\
Answer the question based only on the following context:

{context}

---

Answer the question based on the above context: {question}
";

/// 기본 판정 프롬프트
pub const DEFAULT_JUDGE_TEMPLATE: &str = "
Expected Response: {expected_response}
Actual Response: {actual_response}
---
(Answer with 'true' or 'false') Does the actual response match the expected response?
";

/// 컨텍스트 청크 구분자
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// 검색 결과가 없을 때 컨텍스트 자리에 들어가는 문구
pub const EMPTY_CONTEXT_NOTICE: &str =
    "(No relevant context was found. If the answer is not contained in the context, say that you don't know.)";

// ============================================================================
// Context
// ============================================================================

/// 순위 순서대로 정렬된 컨텍스트 청크 텍스트
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    chunks: Vec<String>,
}

impl Context {
    pub fn new(chunks: Vec<String>) -> Self {
        Self { chunks }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// 구분자로 연결한 컨텍스트 텍스트 (순서 유지)
    pub fn render(&self) -> String {
        self.chunks.join(CONTEXT_SEPARATOR)
    }
}

impl<S: Into<String>> FromIterator<S> for Context {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// PromptBuilder
// ============================================================================

/// 프롬프트 빌더
///
/// 템플릿은 생성 시 검증되고 이후 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    answer_template: String,
    judge_template: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            answer_template: DEFAULT_ANSWER_TEMPLATE.to_string(),
            judge_template: DEFAULT_JUDGE_TEMPLATE.to_string(),
        }
    }
}

impl PromptBuilder {
    /// 템플릿을 지정하여 생성
    ///
    /// 필수 플레이스홀더가 빠져 있으면 `RagError::Config`.
    pub fn new(answer_template: &str, judge_template: &str) -> Result<Self> {
        require_placeholders("answer", answer_template, &["context", "question"])?;
        require_placeholders(
            "judge",
            judge_template,
            &["expected_response", "actual_response"],
        )?;

        Ok(Self {
            answer_template: answer_template.to_string(),
            judge_template: judge_template.to_string(),
        })
    }

    /// 답변 프롬프트 생성 (순수 함수)
    pub fn build_answer_prompt(&self, context: &Context, question: &str) -> String {
        let context_text = if context.is_empty() {
            EMPTY_CONTEXT_NOTICE.to_string()
        } else {
            context.render()
        };

        render(
            &self.answer_template,
            &[("context", context_text.as_str()), ("question", question)],
        )
    }

    /// 판정 프롬프트 생성
    ///
    /// 두 응답을 이스케이프 없이 그대로 삽입합니다.
    pub fn build_judge_prompt(&self, expected: &str, actual: &str) -> String {
        render(
            &self.judge_template,
            &[("expected_response", expected), ("actual_response", actual)],
        )
    }
}

fn require_placeholders(kind: &str, template: &str, names: &[&str]) -> Result<()> {
    for name in names {
        if !template.contains(&format!("{{{}}}", name)) {
            return Err(RagError::Config(format!(
                "{} template is missing the {{{}}} placeholder",
                kind, name
            )));
        }
    }
    Ok(())
}

/// 단일 패스 플레이스홀더 치환
///
/// 알 수 없는 `{...}`는 그대로 둡니다.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });

        match substituted {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_order_preserved() {
        let context: Context = ["first chunk", "second chunk"].into_iter().collect();
        let rendered = context.render();
        assert_eq!(rendered, "first chunk\n\n---\n\nsecond chunk");

        let prompt = PromptBuilder::default().build_answer_prompt(&context, "q?");
        let first = prompt.find("first chunk").unwrap();
        let second = prompt.find("second chunk").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_answer_prompt_contains_question() {
        let context = Context::new(vec!["Paris is the capital of France.".to_string()]);
        let prompt = PromptBuilder::default().build_answer_prompt(&context, "What is the capital?");

        assert!(prompt.starts_with("Answer the question based only on the following context:"));
        assert!(prompt.contains("Paris is the capital of France."));
        assert!(prompt.ends_with("Answer the question based on the above context: What is the capital?\n"));
    }

    #[test]
    fn test_empty_context_prompt() {
        let prompt = PromptBuilder::default().build_answer_prompt(&Context::default(), "What is 1+1?");
        assert!(prompt.contains("based only on the following context"));
        assert!(prompt.contains(EMPTY_CONTEXT_NOTICE));
        assert!(prompt.contains("What is 1+1?"));
    }

    #[test]
    fn test_judge_prompt_verbatim() {
        let prompt = PromptBuilder::default().build_judge_prompt("green", "<b>Green.</b> {question}");
        assert!(prompt.contains("Expected Response: green\n"));
        assert!(prompt.contains("Actual Response: <b>Green.</b> {question}\n"));
        assert!(prompt.contains("(Answer with 'true' or 'false')"));
    }

    #[test]
    fn test_render_single_pass() {
        // 컨텍스트 안의 플레이스홀더는 치환되지 않음
        let context = Context::new(vec!["literal {question} text".to_string()]);
        let prompt = PromptBuilder::default().build_answer_prompt(&context, "real question");
        assert!(prompt.contains("literal {question} text"));
        assert_eq!(prompt.matches("real question").count(), 1);
    }

    #[test]
    fn test_render_unknown_braces() {
        let out = render("{a} {unknown} {b", &[("a", "x")]);
        assert_eq!(out, "x {unknown} {b");
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let result = PromptBuilder::new("{context} only", DEFAULT_JUDGE_TEMPLATE);
        assert!(matches!(result, Err(RagError::Config(_))));

        let result = PromptBuilder::new(DEFAULT_ANSWER_TEMPLATE, "{expected_response}");
        assert!(matches!(result, Err(RagError::Config(_))));
    }

    #[test]
    fn test_custom_templates() {
        let builder = PromptBuilder::new("Q: {question}\nC: {context}", "{expected_response}|{actual_response}").unwrap();
        let context = Context::new(vec!["c1".to_string()]);
        assert_eq!(builder.build_answer_prompt(&context, "q"), "Q: q\nC: c1");
        assert_eq!(builder.build_judge_prompt("e", "a"), "e|a");
    }
}
