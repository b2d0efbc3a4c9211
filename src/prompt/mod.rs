//! Prompt System - Prompt file loading and slot rendering
//!
//! Prompt files are YAML documents loaded from a directory; their template
//! text is rendered with Handlebars.

mod loader;
mod render;

pub use loader::{PromptFile, PromptLoader};
pub use render::PromptRenderer;
