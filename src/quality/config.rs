//! Quality-loop configuration

/// Improvement prompt used when no prompt file provides one
pub const DEFAULT_IMPROVEMENT_TEMPLATE: &str = r#"Your previous response did not meet the quality standards required by the system you are operating in.

Previous response:
{{previous_response}}

Please provide a new response to the user's input: {{user_input}}
Address this feedback: {{feedback}}"#;

/// Thresholds and prompts for the quality-control loop
#[derive(Debug, Clone, PartialEq)]
pub struct QualityConfig {
    /// Score at or above which a candidate is accepted
    pub acceptable_score: f64,

    /// Total candidates per turn, the initial one included
    pub max_attempts: u32,

    /// Handlebars template with `previous_response`, `user_input`, `feedback`
    pub improvement_template: String,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            acceptable_score: 90.0,
            max_attempts: 3,
            improvement_template: DEFAULT_IMPROVEMENT_TEMPLATE.to_string(),
        }
    }
}

impl QualityConfig {
    pub fn with_acceptable_score(mut self, score: f64) -> Self {
        self.acceptable_score = score;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_improvement_template(mut self, template: impl Into<String>) -> Self {
        self.improvement_template = template.into();
        self
    }

    /// Attempt bound actually enforced; the initial candidate is always evaluated
    pub fn attempt_limit(&self) -> u32 {
        self.max_attempts.max(1)
    }
}
