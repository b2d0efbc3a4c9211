//! WritingAgent - operator-controlled agent that plans writing structures.
//!
//! Every task runs against a fresh history built from the task's own system
//! prompt, so one task can never leak its prompt into the next.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use serde_json::json;

use super::conversation::AgentError;
use super::profile::{WritingTask, WritingTaskKind};
use crate::dispatch::{
    KnowledgeTreeDraft, Operator, OperatorError, SectionInstructions, TextSection, WritingStructureDraft,
};
use crate::evaluation::{Evaluate, RubricEvaluator};
use crate::llm::{Message, Provider};
use crate::parsing::{ResponseParser, SectionOutline, WritingParser, WritingResponse};
use crate::quality::{QualityConfig, QualityLoop};

/// Result of one operator task
#[derive(Debug, Clone)]
pub struct WritingOutcome {
    pub response: WritingResponse,
    pub raw: String,
    pub score: Option<f64>,
    pub attempts: u32,
    /// System prompt, request, and winning reply of the task
    pub history: Vec<Message>,
}

impl WritingOutcome {
    pub fn sections(&self) -> Vec<TextSection> {
        self.response.deliverables.iter().map(to_section).collect()
    }
}

fn to_section(outline: &SectionOutline) -> TextSection {
    TextSection {
        content: outline.example_content.clone(),
        creation_instructions: SectionInstructions {
            title: outline.title.clone(),
            instructions: outline.instructions.clone(),
        },
    }
}

/// Creates and refines writing structures on the operator's behalf
pub struct WritingAgent {
    provider: Arc<dyn Provider>,
    quality: QualityLoop,
    parser: WritingParser,
    creation: WritingTask,
    iteration: WritingTask,
}

impl WritingAgent {
    /// Agent using the built-in creation and iteration prompts
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            quality: QualityLoop::new(provider.clone(), QualityConfig::default()),
            provider,
            parser: WritingParser::new(),
            creation: WritingTask::fallback(WritingTaskKind::Creation),
            iteration: WritingTask::fallback(WritingTaskKind::Iteration),
        }
    }

    pub fn with_tasks(mut self, creation: WritingTask, iteration: WritingTask) -> Self {
        self.creation = creation;
        self.iteration = iteration;
        self
    }

    pub fn with_quality(mut self, config: QualityConfig) -> Self {
        self.quality = QualityLoop::new(self.provider.clone(), config);
        self
    }

    /// Task configuration used for `kind`
    pub fn task(&self, kind: WritingTaskKind) -> &WritingTask {
        match kind {
            WritingTaskKind::Creation => &self.creation,
            WritingTaskKind::Iteration => &self.iteration,
        }
    }

    /// Run `request` under `task` and parse the winning reply
    pub async fn process_operator_task(
        &self,
        request: &str,
        task: &WritingTask,
        evaluator: Option<&dyn Evaluate>,
    ) -> Result<WritingOutcome, AgentError> {
        debug!("Writing task '{}' started", task.kind);
        let mut history = vec![Message::system(&task.system_prompt)];

        let initial = self.provider.get_response(request, &history).await?;
        history.push(Message::user(request));

        let outcome = self.quality.run(initial, evaluator, request, &history).await?;
        let response = self.parser.parse(&outcome.text)?;

        history.push(Message::assistant(outcome.text.clone()));
        info!(
            "Writing task '{}' produced {} section(s) after {} attempt(s)",
            task.kind,
            response.deliverables.len(),
            outcome.attempts
        );

        Ok(WritingOutcome {
            response,
            raw: outcome.text,
            score: outcome.score,
            attempts: outcome.attempts,
            history,
        })
    }

    /// Propose a new writing structure for `request`
    pub async fn create_writing_structure(
        &self,
        request: &str,
        evaluator: Option<&dyn Evaluate>,
    ) -> Result<WritingStructureDraft, AgentError> {
        let outcome = self.process_operator_task(request, &self.creation, evaluator).await?;
        let id = format!("ws-{}", Utc::now().timestamp_millis());
        Ok(WritingStructureDraft::new(id, outcome.sections()))
    }

    /// Revise `current` according to `feedback`
    pub async fn refine_writing_structure(
        &self,
        current: &WritingStructureDraft,
        feedback: &str,
        evaluator: Option<&dyn Evaluate>,
    ) -> Result<WritingStructureDraft, AgentError> {
        let request = iteration_request(current, feedback);
        let outcome = self.process_operator_task(&request, &self.iteration, evaluator).await?;
        Ok(WritingStructureDraft {
            id: current.id.clone(),
            approved: false,
            sections: outcome.sections(),
            created_at: current.created_at,
            updated_at: Utc::now(),
        })
    }
}

/// Request for the iteration task: the current sections, in the shape the
/// model answers with, followed by the operator's feedback
fn iteration_request(current: &WritingStructureDraft, feedback: &str) -> String {
    let sections: Vec<_> = current
        .sections
        .iter()
        .map(|section| {
            json!({
                "title": section.creation_instructions.title,
                "instructions": section.creation_instructions.instructions,
                "exampleContent": section.content,
            })
        })
        .collect();
    let structure = json!({ "writingStructureDraft": { "sections": sections } });

    format!("Current writing structure:\n{:#}\n\nFeedback:\n{}", structure, feedback)
}

/// Operator backed by a [`WritingAgent`].
///
/// With a rubric set, each task is evaluated against that task's own system
/// prompt.
pub struct WritingOperator {
    agent: WritingAgent,
    provider: Arc<dyn Provider>,
    rubric: Option<String>,
}

impl WritingOperator {
    pub fn new(agent: WritingAgent, provider: Arc<dyn Provider>) -> Self {
        Self {
            agent,
            provider,
            rubric: None,
        }
    }

    pub fn with_rubric(mut self, rubric: impl Into<String>) -> Self {
        self.rubric = Some(rubric.into());
        self
    }

    pub fn agent(&self) -> &WritingAgent {
        &self.agent
    }

    fn evaluator_for(&self, task: &WritingTask) -> Option<RubricEvaluator> {
        self.rubric
            .as_ref()
            .map(|rubric| RubricEvaluator::new(self.provider.clone(), rubric.clone(), task.system_prompt.clone()))
    }
}

#[async_trait]
impl Operator for WritingOperator {
    async fn get_writing_structure(&self, request_with_context: &str) -> Result<WritingStructureDraft, OperatorError> {
        let evaluator = self.evaluator_for(self.agent.task(WritingTaskKind::Creation));
        self.agent
            .create_writing_structure(request_with_context, evaluator.as_ref().map(|e| e as &dyn Evaluate))
            .await
            .map_err(|e| OperatorError::Task(e.to_string()))
    }

    async fn get_knowledge_tree(&self, request: &str) -> Result<KnowledgeTreeDraft, OperatorError> {
        let id = format!("kt-{}", Utc::now().timestamp_millis());
        Ok(KnowledgeTreeDraft::root_only(id, request))
    }
}
