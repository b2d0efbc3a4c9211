//! Prompt Renderer - Fill template slots using Handlebars
//!
//! Used for the evaluator rubric and the improvement prompt. Rendering is
//! non-strict (missing slots become empty) and never HTML-escapes.

use std::collections::HashMap;

use handlebars::Handlebars;

use crate::error::{QuillError, Result};

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    /// Create a new PromptRenderer with default settings
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Prompts are plain text; HTML escaping would corrupt quotes and code
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template string with the given slot values
    pub fn render(&self, template: &str, context: &HashMap<&str, &str>) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| QuillError::Template(format!("Failed to render template: {}", e)))
    }
}
