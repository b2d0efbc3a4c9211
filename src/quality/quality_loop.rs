//! QualityLoop - evaluate, retry with feedback, keep the best candidate.
//!
//! Each attempt: evaluate the current candidate → accept, or ask the provider
//! for an improved one using the evaluator's feedback → (repeat until the
//! attempt bound). The winner is the highest-scoring candidate seen.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use super::config::QualityConfig;
use crate::evaluation::{Candidate, Evaluate, EvaluationError, select_best};
use crate::llm::{Message, Provider, ProviderError};
use crate::prompt::PromptRenderer;

/// Errors that abort a quality loop
#[derive(Debug, Error)]
pub enum QualityError {
    #[error("Provider error while improving response: {0}")]
    Transport(#[from] ProviderError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("Improvement prompt error: {0}")]
    Template(String),
}

/// Result of one loop run
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    /// Text of the selected candidate
    pub text: String,

    /// Score of the selected candidate, `None` when nothing was evaluated
    pub score: Option<f64>,

    /// Candidates generated, the initial one included
    pub attempts: u32,

    /// Whether some candidate reached the acceptance threshold
    pub accepted: bool,
}

impl LoopOutcome {
    fn unevaluated(text: String) -> Self {
        Self {
            text,
            score: None,
            attempts: 1,
            accepted: false,
        }
    }
}

/// The quality-control loop shared by every agent
pub struct QualityLoop {
    provider: Arc<dyn Provider>,
    config: QualityConfig,
    renderer: PromptRenderer,
}

impl QualityLoop {
    pub fn new(provider: Arc<dyn Provider>, config: QualityConfig) -> Self {
        Self {
            provider,
            config,
            renderer: PromptRenderer::new(),
        }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Run the loop over an already generated `initial` candidate.
    ///
    /// `history` is borrowed read-only as scoring and generation context.
    /// Without an evaluator the initial candidate is returned unevaluated.
    pub async fn run(
        &self,
        initial: String,
        evaluator: Option<&dyn Evaluate>,
        user_input: &str,
        history: &[Message],
    ) -> Result<LoopOutcome, QualityError> {
        let Some(evaluator) = evaluator else {
            debug!("No evaluator supplied, returning initial candidate");
            return Ok(LoopOutcome::unevaluated(initial));
        };

        let limit = self.config.attempt_limit();
        let mut candidates = vec![Candidate::unevaluated(initial)];
        let mut accepted = false;

        loop {
            let attempt = candidates.len();
            let current = &mut candidates[attempt - 1];

            let evaluation = evaluator.evaluate(&current.text, history).await?;
            debug!("Attempt {}/{} scored {}", attempt, limit, evaluation.score);
            current.evaluation = Some(evaluation.clone());

            if evaluation.score >= self.config.acceptable_score {
                info!(
                    "Attempt {}/{} accepted with score {} (threshold {})",
                    attempt, limit, evaluation.score, self.config.acceptable_score
                );
                accepted = true;
                break;
            }

            warn!(
                "Attempt {}/{} rejected with score {}: {}\nExplanation: {}\nFeedback: {}",
                attempt, limit, evaluation.score, current.text, evaluation.explanation, evaluation.feedback
            );

            if attempt >= limit as usize {
                break;
            }

            let prompt = self.improvement_prompt(&current.text, user_input, &evaluation.feedback)?;
            let next = self.provider.get_response(&prompt, history).await?;
            candidates.push(Candidate::unevaluated(next));
        }

        let attempts = candidates.len() as u32;
        let (index, score) = match select_best(&candidates) {
            Some((index, best)) => (index, best.score()),
            None => (0, None),
        };
        if !accepted {
            info!(
                "No candidate reached {} after {} attempts, keeping attempt {} (score {:?})",
                self.config.acceptable_score,
                attempts,
                index + 1,
                score
            );
        }

        let text = candidates.swap_remove(index).text;
        Ok(LoopOutcome {
            text,
            score,
            attempts,
            accepted,
        })
    }

    /// Render the retry prompt for a rejected candidate
    pub fn improvement_prompt(&self, previous: &str, user_input: &str, feedback: &str) -> Result<String, QualityError> {
        let context = HashMap::from([
            ("previous_response", previous),
            ("user_input", user_input),
            ("feedback", feedback),
        ]);
        self.renderer
            .render(&self.config.improvement_template, &context)
            .map_err(|e| QualityError::Template(e.to_string()))
    }
}
