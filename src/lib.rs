//! Quill - quality-controlled conversational agents
//!
//! Every agent response is scored by a second model call, retried with the
//! evaluator's feedback until it clears a threshold, parsed into a structured
//! response, and its tool calls are dispatched to an operator.

pub mod agent;
pub mod dispatch;
pub mod error;
pub mod evaluation;
pub mod history;
pub mod llm;
pub mod parsing;
pub mod prompt;
pub mod quality;

pub use error::{QuillError, Result};
