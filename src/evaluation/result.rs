//! Evaluation results, candidates, and best-of-N selection

use serde::{Deserialize, Serialize};

/// Score and feedback for one candidate response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: f64,
    pub explanation: String,
    pub feedback: String,
}

impl EvaluationResult {
    pub fn new(score: f64, explanation: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            score,
            explanation: explanation.into(),
            feedback: feedback.into(),
        }
    }
}

/// A generated response paired with its evaluation, if it was scored
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub evaluation: Option<EvaluationResult>,
}

impl Candidate {
    pub fn unevaluated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            evaluation: None,
        }
    }

    pub fn evaluated(text: impl Into<String>, evaluation: EvaluationResult) -> Self {
        Self {
            text: text.into(),
            evaluation: Some(evaluation),
        }
    }

    pub fn score(&self) -> Option<f64> {
        self.evaluation.as_ref().map(|e| e.score)
    }
}

/// Pick the evaluated candidate with the highest score.
///
/// Ties go to the earliest candidate; unevaluated candidates never win.
/// Returns `None` when nothing was evaluated.
pub fn select_best(candidates: &[Candidate]) -> Option<(usize, &Candidate)> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| candidate.score().map(|score| (index, candidate, score)))
        .fold(None, |best: Option<(usize, &Candidate, f64)>, current| match best {
            Some(best) if current.2 <= best.2 => Some(best),
            _ => Some(current),
        })
        .map(|(index, candidate, _)| (index, candidate))
}
