//! Error types for Quill
//!
//! Centralized error handling using thiserror. Each component has its own
//! error enum; `QuillError` wraps them for callers that do not care which
//! stage of a turn failed.

use thiserror::Error;

use crate::agent::AgentError;
use crate::evaluation::EvaluationError;
use crate::llm::ProviderError;
use crate::parsing::ParseError;
use crate::quality::QualityError;

/// All error types that can occur in Quill
#[derive(Debug, Error)]
pub enum QuillError {
    /// Provider call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Evaluator output could not be used
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Quality-control loop aborted
    #[error(transparent)]
    Quality(#[from] QualityError),

    /// Winning response failed schema validation
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A turn failed
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Template rendering failed
    #[error("Template error: {0}")]
    Template(String),

    /// Prompt file is missing or lacks the requested template
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Quill operations
pub type Result<T> = std::result::Result<T, QuillError>;
