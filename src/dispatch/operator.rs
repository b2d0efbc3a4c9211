//! Operator - the collaborator that carries out tool calls

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use super::drafts::{KnowledgeTreeDraft, WritingStructureDraft};

/// Errors raised by an operator capability
#[derive(Debug, Clone, Error)]
pub enum OperatorError {
    #[error("Operator task failed: {0}")]
    Task(String),

    #[error("Operator unavailable: {0}")]
    Unavailable(String),
}

/// Capabilities exposed to conversation agents through tool calls
#[async_trait]
pub trait Operator: Send + Sync {
    /// Propose a structural outline for a piece of writing
    async fn get_writing_structure(&self, request_with_context: &str) -> Result<WritingStructureDraft, OperatorError>;

    /// Propose a research outline
    async fn get_knowledge_tree(&self, request: &str) -> Result<KnowledgeTreeDraft, OperatorError>;
}

/// Operator that records each request and answers with empty drafts
#[derive(Debug, Default)]
pub struct MockOperator {
    requests: Mutex<Vec<(String, String)>>,
}

impl MockOperator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(capability, argument)` pairs in call order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn count(&self, capability: &str) -> usize {
        self.requests().iter().filter(|(name, _)| name == capability).count()
    }

    fn record(&self, capability: &str, argument: &str) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((capability.to_string(), argument.to_string()));
        }
    }
}

#[async_trait]
impl Operator for MockOperator {
    async fn get_writing_structure(&self, request_with_context: &str) -> Result<WritingStructureDraft, OperatorError> {
        self.record("getWritingStructure", request_with_context);
        Ok(WritingStructureDraft::new("mock-ws", Vec::new()))
    }

    async fn get_knowledge_tree(&self, request: &str) -> Result<KnowledgeTreeDraft, OperatorError> {
        self.record("getKnowledgeTree", request);
        Ok(KnowledgeTreeDraft::root_only("mock-kt", request))
    }
}
