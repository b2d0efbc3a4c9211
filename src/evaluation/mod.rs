//! Response evaluation
//!
//! Scores candidate responses with a second model call and selects the best
//! of several candidates.

mod evaluator;
mod mock;
mod result;

pub use evaluator::{DEFAULT_RUBRIC, Evaluate, EvaluationError, RubricEvaluator, parse_evaluation};
pub use mock::MockEvaluator;
pub use result::{Candidate, EvaluationResult, select_best};
