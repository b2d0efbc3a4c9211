//! LLM-as-evaluator scoring.
//!
//! A second model call scores a candidate response against the system prompt
//! the responding agent was supposed to obey. The rubric is a template with
//! three slots:
//!
//! - `{{original_system_prompt}}` - system prompt of the agent under evaluation
//! - `{{conversation_history}}` - `role: content` lines of the history
//! - `{{current_message}}` - the candidate being scored
//!
//! The evaluator must answer with a JSON object carrying `score`,
//! `explanation` and `feedback`. Anything else is an error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::result::EvaluationResult;
use crate::llm::{Message, Provider, ProviderError, render_history};
use crate::parsing::decode_object;
use crate::prompt::PromptRenderer;

/// Rubric used when no prompt file provides one
pub const DEFAULT_RUBRIC: &str = r#"You evaluate whether an assistant followed the system prompt it was given.

## System prompt of the assistant
{{original_system_prompt}}

## Conversation so far
{{conversation_history}}

## Response to evaluate
{{current_message}}

Score the response from 0 to 100 for how well it obeys the system prompt,
including its required output format. Reply with only a JSON object:
{"score": <number>, "explanation": "<why this score>", "feedback": "<what to change to reach 100>"}"#;

/// Errors from evaluation
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Evaluator provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Evaluator template error: {0}")]
    Template(String),

    #[error("Failed to parse evaluation result: {message}")]
    Malformed { message: String, raw: String },
}

/// Scores a candidate response in the context of a conversation
#[async_trait]
pub trait Evaluate: Send + Sync {
    async fn evaluate(&self, candidate: &str, history: &[Message]) -> Result<EvaluationResult, EvaluationError>;
}

/// Evaluator driven by a rubric template and a provider
pub struct RubricEvaluator {
    provider: Arc<dyn Provider>,
    rubric: String,
    target_system_prompt: String,
    renderer: PromptRenderer,
}

impl RubricEvaluator {
    /// Create an evaluator for an agent whose system prompt is `target_system_prompt`
    pub fn new(provider: Arc<dyn Provider>, rubric: impl Into<String>, target_system_prompt: impl Into<String>) -> Self {
        Self {
            provider,
            rubric: rubric.into(),
            target_system_prompt: target_system_prompt.into(),
            renderer: PromptRenderer::new(),
        }
    }

    /// Evaluator using [`DEFAULT_RUBRIC`]
    pub fn with_default_rubric(provider: Arc<dyn Provider>, target_system_prompt: impl Into<String>) -> Self {
        Self::new(provider, DEFAULT_RUBRIC, target_system_prompt)
    }

    pub fn target_system_prompt(&self) -> &str {
        &self.target_system_prompt
    }

    /// Fill the rubric slots
    pub fn build_prompt(&self, candidate: &str, history: &[Message]) -> Result<String, EvaluationError> {
        let conversation = render_history(history);
        let context = HashMap::from([
            ("original_system_prompt", self.target_system_prompt.as_str()),
            ("conversation_history", conversation.as_str()),
            ("current_message", candidate),
        ]);

        self.renderer
            .render(&self.rubric, &context)
            .map_err(|e| EvaluationError::Template(e.to_string()))
    }
}

#[async_trait]
impl Evaluate for RubricEvaluator {
    async fn evaluate(&self, candidate: &str, history: &[Message]) -> Result<EvaluationResult, EvaluationError> {
        let prompt = self.build_prompt(candidate, history)?;
        let raw = self.provider.get_response(&prompt, history).await?;
        log::debug!("Raw evaluation: {}", raw);
        parse_evaluation(&raw)
    }
}

/// Decode an evaluator reply into an [`EvaluationResult`]
pub fn parse_evaluation(raw: &str) -> Result<EvaluationResult, EvaluationError> {
    let malformed = |message: String| EvaluationError::Malformed {
        message,
        raw: raw.to_string(),
    };

    let object = decode_object(raw).map_err(malformed)?;
    let result: EvaluationResult =
        serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| malformed(e.to_string()))?;

    if !result.score.is_finite() {
        return Err(malformed(format!("score {} is not a finite number", result.score)));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockProvider;

    fn history() -> Vec<Message> {
        vec![Message::system("Answer in JSON"), Message::user("Outline an essay on bees")]
    }

    #[test]
    fn test_build_prompt_fills_slots() {
        let evaluator = RubricEvaluator::new(
            Arc::new(MockProvider::new()),
            "PROMPT={{original_system_prompt}}\nHISTORY={{conversation_history}}\nMSG={{current_message}}",
            "Answer in JSON",
        );

        let prompt = evaluator.build_prompt(r#"{"answerToUser": "ok"}"#, &history()).unwrap();
        assert_eq!(
            prompt,
            "PROMPT=Answer in JSON\nHISTORY=system: Answer in JSON\nuser: Outline an essay on bees\nMSG={\"answerToUser\": \"ok\"}"
        );
    }

    #[test]
    fn test_default_rubric_mentions_all_fields() {
        let evaluator = RubricEvaluator::with_default_rubric(Arc::new(MockProvider::new()), "Be brief");
        let prompt = evaluator.build_prompt("candidate text", &history()).unwrap();
        assert!(prompt.contains("Be brief"));
        assert!(prompt.contains("candidate text"));
        assert!(prompt.contains("user: Outline an essay on bees"));
        assert!(prompt.contains("\"feedback\""));
    }

    #[tokio::test]
    async fn test_evaluate_sends_prompt_with_history() {
        let provider = Arc::new(MockProvider::always(r#"{"score": 95, "explanation": "ok", "feedback": ""}"#));
        let evaluator = RubricEvaluator::new(provider.clone(), "Rate: {{current_message}}", "sys");

        let result = evaluator.evaluate("hello", &history()).await.unwrap();
        assert_eq!(result, EvaluationResult::new(95.0, "ok", ""));

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "Rate: hello");
        assert_eq!(calls[0].history, history());
    }

    #[tokio::test]
    async fn test_evaluate_accepts_fenced_reply() {
        let reply = "```json\n{\"score\": 72, \"explanation\": \"meh\", \"feedback\": \"add detail\"}\n```";
        let evaluator = RubricEvaluator::new(Arc::new(MockProvider::always(reply)), "x", "y");
        let result = evaluator.evaluate("c", &[]).await.unwrap();
        assert_eq!(result.score, 72.0);
        assert_eq!(result.feedback, "add detail");
    }

    #[tokio::test]
    async fn test_evaluate_malformed_reply_is_error() {
        let evaluator = RubricEvaluator::new(Arc::new(MockProvider::always("Looks great, 9/10")), "x", "y");
        let err = evaluator.evaluate("c", &[]).await.unwrap_err();
        match err {
            EvaluationError::Malformed { raw, .. } => assert_eq!(raw, "Looks great, 9/10"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_evaluate_missing_field_is_error() {
        let evaluator = RubricEvaluator::new(Arc::new(MockProvider::always(r#"{"score": 99}"#)), "x", "y");
        assert!(matches!(
            evaluator.evaluate("c", &[]).await,
            Err(EvaluationError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_evaluate_provider_failure_propagates() {
        let provider = MockProvider::new();
        provider.push_error("503");
        let evaluator = RubricEvaluator::new(Arc::new(provider), "x", "y");
        assert!(matches!(
            evaluator.evaluate("c", &[]).await,
            Err(EvaluationError::Provider(_))
        ));
    }

    #[test]
    fn test_parse_evaluation_string_score_rejected() {
        let err = parse_evaluation(r#"{"score": "high", "explanation": "", "feedback": ""}"#).unwrap_err();
        assert!(matches!(err, EvaluationError::Malformed { .. }));
    }
}
