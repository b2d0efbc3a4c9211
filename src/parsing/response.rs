//! Structured responses produced by the parsers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::cleanup::value_kind;

/// A request from the model to invoke a named capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Response of a user-facing agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub reasoning: String,
    pub answer_to_user: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl ConversationResponse {
    /// The JSON shape the model is asked to emit
    pub fn to_json(&self) -> Value {
        json!({
            "reasoning": self.reasoning,
            "answerToUser": self.answer_to_user,
            "toolCalls": self.tool_calls,
        })
    }
}

/// One section of a proposed writing structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionOutline {
    pub title: String,
    pub instructions: String,
    pub example_content: String,
}

/// Response of an operator-controlled writing agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritingResponse {
    pub reasoning: String,
    pub message_to_operator: String,
    /// Ordered sections of the writing-structure deliverable
    pub deliverables: Vec<SectionOutline>,
}

impl WritingResponse {
    /// The JSON shape the model is asked to emit
    pub fn to_json(&self) -> Value {
        json!({
            "reasoning": self.reasoning,
            "messageToOperator": self.message_to_operator,
            "deliverables": {
                "writingStructureDraft": { "sections": self.deliverables }
            }
        })
    }
}

/// Either agent response shape
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredResponse {
    Conversation(ConversationResponse),
    Writing(WritingResponse),
}

impl StructuredResponse {
    pub fn reasoning(&self) -> &str {
        match self {
            StructuredResponse::Conversation(r) => &r.reasoning,
            StructuredResponse::Writing(r) => &r.reasoning,
        }
    }

    /// The primary text: answer to the user or message to the operator
    pub fn primary_text(&self) -> &str {
        match self {
            StructuredResponse::Conversation(r) => &r.answer_to_user,
            StructuredResponse::Writing(r) => &r.message_to_operator,
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            StructuredResponse::Conversation(r) => &r.tool_calls,
            StructuredResponse::Writing(_) => &[],
        }
    }
}

/// Name of a tool-call entry in any accepted shape.
///
/// Accepts `{name, ...}` and `{function: {name, ...}}`.
pub(crate) fn tool_call_name(entry: &Value) -> Option<&str> {
    call_body(entry)?.get("name")?.as_str()
}

fn call_body(entry: &Value) -> Option<&Map<String, Value>> {
    let object = entry.as_object()?;
    match object.get("function") {
        Some(Value::Object(function)) => Some(function),
        _ => Some(object),
    }
}

/// Convert one emitted call into canonical form.
///
/// Arguments may be an object, or a string holding a JSON object. Any other
/// payload drops the call with a warning.
pub(crate) fn normalize_tool_call(entry: &Value) -> Option<ToolCall> {
    let body = call_body(entry)?;
    let name = body.get("name")?.as_str()?.to_string();
    let payload = body.get("arguments").or_else(|| body.get("args"));

    let arguments = match payload {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(map)) => map,
            _ => {
                log::warn!("Dropping tool call '{}': arguments string is not a JSON object", name);
                return None;
            }
        },
        Some(other) => {
            log::warn!(
                "Dropping tool call '{}': arguments must be an object, got {}",
                name,
                value_kind(other)
            );
            return None;
        }
        None => {
            log::warn!("Dropping tool call '{}': no arguments given", name);
            return None;
        }
    };

    Some(ToolCall { name, arguments })
}
