//! Scripted evaluator for tests and offline runs

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::evaluator::{Evaluate, EvaluationError};
use super::result::EvaluationResult;
use crate::llm::Message;

/// Serves queued evaluation results in order and records every candidate it saw.
///
/// When the queue runs dry the last served result is repeated; with nothing
/// ever queued the call fails as malformed.
#[derive(Default)]
pub struct MockEvaluator {
    results: Mutex<VecDeque<Result<EvaluationResult, String>>>,
    last: Mutex<Option<EvaluationResult>>,
    seen: Mutex<Vec<String>>,
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator returning one result per score, in order
    pub fn with_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let evaluator = Self::new();
        for score in scores {
            evaluator.push_score(score);
        }
        evaluator
    }

    pub fn push_result(&self, result: EvaluationResult) {
        self.lock_results().push_back(Ok(result));
    }

    pub fn push_score(&self, score: f64) {
        self.push_result(EvaluationResult::new(score, format!("scored {}", score), format!("improve on {}", score)));
    }

    /// Queue a malformed evaluator reply
    pub fn push_malformed(&self, raw: impl Into<String>) {
        self.lock_results().push_back(Err(raw.into()));
    }

    /// Candidate texts evaluated so far, in call order
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().map(|seen| seen.len()).unwrap_or_default()
    }

    fn lock_results(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<EvaluationResult, String>>> {
        self.results.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Evaluate for MockEvaluator {
    async fn evaluate(&self, candidate: &str, _history: &[Message]) -> Result<EvaluationResult, EvaluationError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(candidate.to_string());
        }

        let next = self.lock_results().pop_front();
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match next {
            Some(Ok(result)) => {
                *last = Some(result.clone());
                Ok(result)
            }
            Some(Err(raw)) => Err(EvaluationError::Malformed {
                message: "scripted malformed reply".to_string(),
                raw,
            }),
            None => last.clone().ok_or_else(|| EvaluationError::Malformed {
                message: "no scripted evaluation left".to_string(),
                raw: String::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_in_order_then_repeats_last() {
        let evaluator = MockEvaluator::with_scores([40.0, 96.0]);
        assert_eq!(evaluator.evaluate("a", &[]).await.unwrap().score, 40.0);
        assert_eq!(evaluator.evaluate("b", &[]).await.unwrap().score, 96.0);
        assert_eq!(evaluator.evaluate("c", &[]).await.unwrap().score, 96.0);
        assert_eq!(evaluator.seen(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_empty_fails() {
        let evaluator = MockEvaluator::new();
        assert!(evaluator.evaluate("a", &[]).await.is_err());
        assert_eq!(evaluator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed() {
        let evaluator = MockEvaluator::new();
        evaluator.push_malformed("garbage");
        match evaluator.evaluate("a", &[]).await {
            Err(EvaluationError::Malformed { raw, .. }) => assert_eq!(raw, "garbage"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
