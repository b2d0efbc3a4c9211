//! Agents
//!
//! Composition roots wiring provider, evaluator, quality loop, parser, and
//! dispatcher together per request.

mod conversation;
mod profile;
mod session;
mod writing;

pub use conversation::{AgentError, ConversationAgent, TurnOutcome};
pub use profile::{
    AgentProfile, CONVERSATION_TEMPLATE, ConversationProfile, DEFAULT_CONVERSATION_PROMPT, EVALUATOR_TEMPLATE,
    WRITING_TEMPLATE, WritingTask, WritingTaskKind,
};
pub use session::{AgentState, SessionPool};
pub use writing::{WritingAgent, WritingOperator, WritingOutcome};
