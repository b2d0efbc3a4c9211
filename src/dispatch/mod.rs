//! Tool-call dispatch
//!
//! Routes the tool calls embedded in a structured response to the matching
//! capability of an [`Operator`].

mod dispatcher;
mod drafts;
mod operator;
mod registry;

pub use dispatcher::{DispatchError, DispatchReport, Dispatcher, Invocation};
pub use drafts::{
    AnalysisDepth, Draft, KnowledgeNode, KnowledgeTreeDraft, SectionInstructions, TextSection, WritingStructureDraft,
};
pub use operator::{MockOperator, Operator, OperatorError};
pub use registry::{Capability, CapabilityFuture, CapabilityRegistry};
