//! Agent profiles: the system prompt and template an agent variant runs with

use std::collections::HashMap;

use log::warn;

use crate::dispatch::CapabilityRegistry;
use crate::parsing::ResponseKind;
use crate::prompt::{PromptFile, PromptLoader, PromptRenderer};

/// Prompt file holding the conversation agent's system prompt
pub const CONVERSATION_TEMPLATE: &str = "conversation";

/// Prompt file holding the writing agent's `creation` and `iteration` templates
pub const WRITING_TEMPLATE: &str = "writing";

/// Prompt file holding the evaluator rubric
pub const EVALUATOR_TEMPLATE: &str = "evaluator";

/// Conversation prompt used when no prompt file provides one
pub const DEFAULT_CONVERSATION_PROMPT: &str = r#"You are the conversation agent of a writing assistant. Talk with the user to understand what they want written, then ask the operator for the pieces of work you need.

You can request work from the operator with these tools:
{{tools}}

Always answer with a single JSON object and nothing else:
{
  "reasoning": "<your private reasoning about the user's needs>",
  "answerToUser": "<what the user will read>",
  "toolCalls": [{"name": "<tool name>", "arguments": {"<parameter>": "<value>"}}]
}
Leave "toolCalls" empty until you have enough context to call a tool."#;

/// What every agent variant supplies to the shared loop
pub trait AgentProfile: Send + Sync {
    /// System prompt placed first in the agent's history
    fn system_prompt(&self) -> &str;

    /// Name of the prompt file the system prompt comes from
    fn template_name(&self) -> &str;

    /// Response shape the agent must produce
    fn response_kind(&self) -> ResponseKind;
}

/// Profile of the user-facing conversation agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationProfile {
    system_prompt: String,
}

impl ConversationProfile {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }

    /// Render `template`, filling `{{tools}}` with the registry's capabilities
    pub fn with_tools(template: &str, registry: &CapabilityRegistry) -> crate::Result<Self> {
        let tools = registry.describe();
        let context = HashMap::from([("tools", tools.as_str())]);
        let system_prompt = PromptRenderer::new().render(template, &context)?;
        Ok(Self::new(system_prompt))
    }

    /// Load the conversation template, falling back to the built-in prompt
    pub fn load(loader: &PromptLoader, name: &str, registry: &CapabilityRegistry) -> crate::Result<Self> {
        let template = match loader.load_template(name) {
            Ok(template) => template,
            Err(e) => {
                warn!("Using built-in conversation prompt: {}", e);
                DEFAULT_CONVERSATION_PROMPT.to_string()
            }
        };
        Self::with_tools(&template, registry)
    }
}

impl AgentProfile for ConversationProfile {
    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn template_name(&self) -> &str {
        CONVERSATION_TEMPLATE
    }

    fn response_kind(&self) -> ResponseKind {
        ResponseKind::Conversation
    }
}

/// Which writing task the operator asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritingTaskKind {
    Creation,
    Iteration,
}

impl WritingTaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WritingTaskKind::Creation => "creation",
            WritingTaskKind::Iteration => "iteration",
        }
    }
}

impl std::fmt::Display for WritingTaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-call configuration of the writing agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritingTask {
    pub kind: WritingTaskKind,
    pub system_prompt: String,
}

impl WritingTask {
    pub fn new(kind: WritingTaskKind, system_prompt: impl Into<String>) -> Self {
        Self {
            kind,
            system_prompt: system_prompt.into(),
        }
    }

    /// Built-in prompt for `kind`
    pub fn fallback(kind: WritingTaskKind) -> Self {
        let target = match kind {
            WritingTaskKind::Creation => "a new document",
            WritingTaskKind::Iteration => "improving an existing document",
        };
        Self::new(
            kind,
            format!(
                "You are a writing structure expert. Create a well-organized outline for {}.\n\
                 Answer with a single JSON object: {{\"reasoning\": \"...\", \"messageToOperator\": \"...\", \
                 \"deliverables\": {{\"writingStructureDraft\": {{\"sections\": [{{\"title\": \"...\", \
                 \"instructions\": \"...\", \"exampleContent\": \"...\"}}]}}}}}}",
                target
            ),
        )
    }

    /// Pick the template named after `kind` from a prompt file
    pub fn from_prompt_file(file: &PromptFile, kind: WritingTaskKind) -> Self {
        match file.named(kind.as_str()) {
            Some(template) => Self::new(kind, template),
            None => {
                warn!("Prompt '{}' has no '{}' template, using built-in prompt", file.id, kind);
                Self::fallback(kind)
            }
        }
    }

    /// Load the task's template from `loader`, falling back to the built-in prompt
    pub fn load(loader: &PromptLoader, name: &str, kind: WritingTaskKind) -> Self {
        match loader.load(name) {
            Ok(file) => Self::from_prompt_file(&file, kind),
            Err(e) => {
                warn!("Failed to load writing prompt '{}': {}", name, e);
                Self::fallback(kind)
            }
        }
    }
}

impl AgentProfile for WritingTask {
    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn template_name(&self) -> &str {
        WRITING_TEMPLATE
    }

    fn response_kind(&self) -> ResponseKind {
        ResponseKind::Writing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_conversation_profile_lists_tools() {
        let profile = ConversationProfile::with_tools(DEFAULT_CONVERSATION_PROMPT, &CapabilityRegistry::standard()).unwrap();
        assert!(profile.system_prompt().contains("getWritingStructure(requestWithContext: string)"));
        assert!(!profile.system_prompt().contains("{{tools}}"));
        assert_eq!(profile.response_kind(), ResponseKind::Conversation);
        assert_eq!(profile.template_name(), CONVERSATION_TEMPLATE);
    }

    #[test]
    fn test_conversation_profile_missing_file_uses_default() {
        let dir = tempdir().unwrap();
        let loader = PromptLoader::new(dir.path());
        let profile = ConversationProfile::load(&loader, "conversation", &CapabilityRegistry::standard()).unwrap();
        assert!(profile.system_prompt().contains("answerToUser"));
    }

    #[test]
    fn test_writing_task_from_prompt_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("writing.yaml"),
            "id: writing\nversion: '1'\ndescription: writing agent\ntemplates:\n  creation: Create an outline\n  iteration: Revise the outline\n",
        )
        .unwrap();
        let loader = PromptLoader::new(dir.path());

        let creation = WritingTask::load(&loader, "writing", WritingTaskKind::Creation);
        let iteration = WritingTask::load(&loader, "writing", WritingTaskKind::Iteration);
        assert_eq!(creation.system_prompt, "Create an outline");
        assert_eq!(iteration.system_prompt, "Revise the outline");
        assert_eq!(creation.response_kind(), ResponseKind::Writing);
    }

    #[test]
    fn test_writing_task_missing_template_falls_back() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("writing.yaml"),
            "id: writing\ntemplates:\n  creation: Create an outline\n",
        )
        .unwrap();
        let loader = PromptLoader::new(dir.path());

        let task = WritingTask::load(&loader, "writing", WritingTaskKind::Iteration);
        assert_eq!(task, WritingTask::fallback(WritingTaskKind::Iteration));
        assert!(task.system_prompt.contains("improving an existing document"));
    }

    #[test]
    fn test_writing_task_missing_file_falls_back() {
        let dir = tempdir().unwrap();
        let loader = PromptLoader::new(dir.path());
        let task = WritingTask::load(&loader, "writing", WritingTaskKind::Creation);
        assert!(task.system_prompt.contains("a new document"));
    }
}
