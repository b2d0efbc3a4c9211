//! Quality-control loop
//!
//! Generates, scores, and retries candidate responses until one clears the
//! acceptance threshold or the attempt bound is reached.

mod config;
mod quality_loop;

pub use config::{DEFAULT_IMPROVEMENT_TEMPLATE, QualityConfig};
pub use quality_loop::{LoopOutcome, QualityError, QualityLoop};
