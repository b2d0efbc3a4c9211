//! ConversationAgent - the user-facing agent.
//!
//! A turn: user message → initial candidate → quality loop → parse →
//! dispatch tool calls → commit user and assistant messages to history.
//! History is only touched after the whole turn succeeded.

use std::sync::Arc;

use log::{debug, info};
use thiserror::Error;

use super::profile::AgentProfile;
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::evaluation::{Evaluate, EvaluationError};
use crate::llm::{Message, Provider, ProviderError};
use crate::parsing::{ConversationParser, ConversationResponse, ParseError, ResponseParser};
use crate::quality::{QualityConfig, QualityError, QualityLoop};

/// Errors that fail a turn
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Provider error: {0}")]
    Transport(#[from] ProviderError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Template error: {0}")]
    Template(String),
}

impl From<QualityError> for AgentError {
    fn from(e: QualityError) -> Self {
        match e {
            QualityError::Transport(e) => AgentError::Transport(e),
            QualityError::Evaluation(e) => AgentError::Evaluation(e),
            QualityError::Template(message) => AgentError::Template(message),
        }
    }
}

/// Everything a caller learns from one successful turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: ConversationResponse,
    /// Winning text exactly as the model produced it
    pub raw: String,
    pub score: Option<f64>,
    pub attempts: u32,
    pub accepted: bool,
    pub dispatch: DispatchReport,
}

/// Agent that talks with the user and hands work to the operator
pub struct ConversationAgent {
    provider: Arc<dyn Provider>,
    history: Vec<Message>,
    quality: QualityLoop,
    evaluator: Option<Arc<dyn Evaluate>>,
    parser: ConversationParser,
    dispatcher: Dispatcher,
}

impl ConversationAgent {
    pub fn new(provider: Arc<dyn Provider>, profile: &dyn AgentProfile, dispatcher: Dispatcher) -> Self {
        Self {
            quality: QualityLoop::new(provider.clone(), QualityConfig::default()),
            provider,
            history: vec![Message::system(profile.system_prompt())],
            evaluator: None,
            parser: ConversationParser::new(),
            dispatcher,
        }
    }

    /// Evaluate every turn with `evaluator`
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluate>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_quality(mut self, config: QualityConfig) -> Self {
        self.quality = QualityLoop::new(self.provider.clone(), config);
        self
    }

    /// Full conversation history, system prompt first
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn system_prompt(&self) -> &str {
        self.history.first().map(|m| m.content.as_str()).unwrap_or_default()
    }

    /// Replace the system prompt after the profile's template was reloaded
    pub fn reload_profile(&mut self, profile: &dyn AgentProfile) {
        let system = Message::system(profile.system_prompt());
        match self.history.first_mut() {
            Some(first) => *first = system,
            None => self.history.push(system),
        }
    }

    /// Run one turn with the agent's own evaluator, if any
    pub async fn respond_to(&mut self, user_message: &str) -> Result<TurnOutcome, AgentError> {
        let evaluator = self.evaluator.clone();
        self.respond_with(user_message, evaluator.as_deref()).await
    }

    /// Run one turn with an explicit evaluator; `None` skips quality control
    pub async fn respond_with(
        &mut self,
        user_message: &str,
        evaluator: Option<&dyn Evaluate>,
    ) -> Result<TurnOutcome, AgentError> {
        debug!("Turn started with {} messages of history", self.history.len());

        // The provider appends the prompt as the final user turn itself
        let initial = self.provider.get_response(user_message, &self.history).await?;

        let mut working = self.history.clone();
        working.push(Message::user(user_message));

        let outcome = self.quality.run(initial, evaluator, user_message, &working).await?;
        let response = self.parser.parse(&outcome.text)?;
        let dispatch = self.dispatcher.dispatch_all(&response.tool_calls).await;

        working.push(Message::assistant(outcome.text.clone()));
        self.history = working;
        info!(
            "Turn committed after {} attempt(s), score {:?}, {} tool call(s) invoked",
            outcome.attempts,
            outcome.score,
            dispatch.invoked.len()
        );

        Ok(TurnOutcome {
            response,
            raw: outcome.text,
            score: outcome.score,
            attempts: outcome.attempts,
            accepted: outcome.accepted,
            dispatch,
        })
    }
}
