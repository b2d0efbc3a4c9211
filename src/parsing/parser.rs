//! Response parsers: cleanup, decode, validate, normalize.

use serde_json::{Map, Value};
use thiserror::Error;

use super::cleanup::decode_object;
use super::response::{
    ConversationResponse, SectionOutline, StructuredResponse, WritingResponse, normalize_tool_call, tool_call_name,
};
use super::schema::{FieldKind, FieldRule, Schema};

/// The winning response could not be turned into a structured response.
///
/// Carries the verbatim model output for diagnosis.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub violations: Vec<String>,
    pub raw: String,
}

impl ParseError {
    fn undecodable(reason: String, raw: &str) -> Self {
        Self {
            message: format!("Failed to parse response: {}", reason),
            violations: Vec::new(),
            raw: raw.to_string(),
        }
    }

    fn invalid(violations: Vec<String>, raw: &str) -> Self {
        Self {
            message: format!("Invalid response format: {}", violations.join(", ")),
            violations,
            raw: raw.to_string(),
        }
    }
}

/// Which response shape to expect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Conversation,
    Writing,
}

/// Turns raw model text into a typed response
pub trait ResponseParser {
    type Output;

    fn schema(&self) -> &Schema;

    /// Build the output from an object that already passed the schema
    fn build(&self, data: Map<String, Value>) -> Self::Output;

    fn parse(&self, raw: &str) -> Result<Self::Output, ParseError> {
        let data = decode_object(raw).map_err(|reason| ParseError::undecodable(reason, raw))?;
        self.schema()
            .validate(&data)
            .map_err(|violations| ParseError::invalid(violations, raw))?;
        Ok(self.build(data))
    }
}

/// Parse `raw` with the parser for `kind`
pub fn parse_response(kind: ResponseKind, raw: &str) -> Result<StructuredResponse, ParseError> {
    match kind {
        ResponseKind::Conversation => ConversationParser::new().parse(raw).map(StructuredResponse::Conversation),
        ResponseKind::Writing => WritingParser::new().parse(raw).map(StructuredResponse::Writing),
    }
}

fn take_string(data: &mut Map<String, Value>, field: &str) -> String {
    match data.remove(field) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

fn tool_calls_well_formed(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|calls| calls.iter().all(|call| tool_call_name(call).is_some()))
}

/// Parser for `{reasoning, answerToUser, toolCalls?}`
pub struct ConversationParser {
    schema: Schema,
}

impl ConversationParser {
    pub fn new() -> Self {
        let schema = Schema::new()
            .field(FieldRule::required("reasoning", FieldKind::String))
            .field(FieldRule::required("answerToUser", FieldKind::String))
            .field(FieldRule::optional("toolCalls", FieldKind::Array).with_check(
                "every tool call must be an object with a string name",
                tool_calls_well_formed,
            ));
        Self { schema }
    }
}

impl Default for ConversationParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser for ConversationParser {
    type Output = ConversationResponse;

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn build(&self, mut data: Map<String, Value>) -> ConversationResponse {
        let tool_calls = match data.get("toolCalls") {
            Some(Value::Array(entries)) => entries.iter().filter_map(normalize_tool_call).collect(),
            _ => Vec::new(),
        };

        ConversationResponse {
            reasoning: take_string(&mut data, "reasoning"),
            answer_to_user: take_string(&mut data, "answerToUser"),
            tool_calls,
        }
    }
}

fn non_empty_string(value: Option<&Value>) -> bool {
    value.and_then(Value::as_str).is_some_and(|s| !s.is_empty())
}

fn deliverables_well_formed(value: &Value) -> bool {
    let Some(sections) = value
        .get("writingStructureDraft")
        .and_then(|draft| draft.get("sections"))
        .and_then(Value::as_array)
    else {
        return false;
    };

    sections.iter().all(|section| {
        non_empty_string(section.get("title"))
            && non_empty_string(section.get("instructions"))
            && non_empty_string(section.get("exampleContent"))
    })
}

/// Parser for `{reasoning, messageToOperator, deliverables?}`
pub struct WritingParser {
    schema: Schema,
}

impl WritingParser {
    pub fn new() -> Self {
        let schema = Schema::new()
            .field(FieldRule::required("reasoning", FieldKind::String))
            .field(FieldRule::required("messageToOperator", FieldKind::String))
            .field(FieldRule::optional("deliverables", FieldKind::Object).with_check(
                "writingStructureDraft.sections must list sections with title, instructions and exampleContent",
                deliverables_well_formed,
            ));
        Self { schema }
    }
}

impl Default for WritingParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser for WritingParser {
    type Output = WritingResponse;

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn build(&self, mut data: Map<String, Value>) -> WritingResponse {
        let deliverables = data
            .get("deliverables")
            .and_then(|d| d.get("writingStructureDraft"))
            .and_then(|draft| draft.get("sections"))
            .and_then(|sections| serde_json::from_value::<Vec<SectionOutline>>(sections.clone()).ok())
            .unwrap_or_default();

        WritingResponse {
            reasoning: take_string(&mut data, "reasoning"),
            message_to_operator: take_string(&mut data, "messageToOperator"),
            deliverables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::ToolCall;
    use serde_json::json;

    fn conversation_json(tool_calls: Value) -> String {
        json!({
            "reasoning": "The user wants an outline",
            "answerToUser": "Let me draft one.",
            "toolCalls": tool_calls
        })
        .to_string()
    }

    #[test]
    fn test_parse_conversation_without_tool_calls() {
        let raw = r#"{"reasoning": "r", "answerToUser": "a"}"#;
        let response = ConversationParser::new().parse(raw).unwrap();
        assert_eq!(response.reasoning, "r");
        assert_eq!(response.answer_to_user, "a");
        assert!(response.tool_calls.is_empty());
    }

    #[test]
    fn test_parse_conversation_with_tool_calls() {
        let raw = conversation_json(json!([
            {"name": "getWritingStructure", "arguments": {"requestWithContext": "essay on bees"}},
            {"name": "getKnowledgeTree", "arguments": {"request": "bees"}}
        ]));

        let response = ConversationParser::new().parse(&raw).unwrap();
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].name, "getWritingStructure");
        assert_eq!(response.tool_calls[1].arguments["request"], "bees");
    }

    #[test]
    fn test_round_trip_conversation() {
        let mut arguments = Map::new();
        arguments.insert("request".to_string(), json!("bees"));
        let original = ConversationResponse {
            reasoning: "because".to_string(),
            answer_to_user: "Here you go".to_string(),
            tool_calls: vec![ToolCall::new("getKnowledgeTree", arguments)],
        };

        let raw = original.to_json().to_string();
        assert_eq!(ConversationParser::new().parse(&raw).unwrap(), original);

        let empty = ConversationResponse {
            tool_calls: Vec::new(),
            ..original
        };
        assert_eq!(ConversationParser::new().parse(&empty.to_json().to_string()).unwrap(), empty);
    }

    #[test]
    fn test_fenced_parses_identically() {
        let raw = conversation_json(json!([{"name": "getKnowledgeTree", "arguments": {"request": "x"}}]));
        let fenced = format!("```json\n{}\n```", raw);

        let parser = ConversationParser::new();
        assert_eq!(parser.parse(&raw).unwrap(), parser.parse(&fenced).unwrap());
    }

    #[test]
    fn test_leading_prose_is_discarded() {
        let raw = format!("Here is my answer:\n{}", conversation_json(json!([])));
        assert!(ConversationParser::new().parse(&raw).is_ok());
    }

    #[test]
    fn test_not_json_keeps_raw_text() {
        let err = ConversationParser::new().parse("not json").unwrap_err();
        assert_eq!(err.raw, "not json");
        assert!(err.message.starts_with("Failed to parse response"));
        assert!(err.violations.is_empty());
    }

    #[test]
    fn test_enumerates_all_violations() {
        let raw = r#"{"answerToUser": 42, "toolCalls": "none"}"#;
        let err = ConversationParser::new().parse(raw).unwrap_err();

        assert_eq!(err.violations.len(), 3);
        assert!(err.message.contains("'reasoning' is missing"));
        assert!(err.message.contains("'answerToUser' should be of type 'string'"));
        assert!(err.message.contains("'toolCalls' should be of type 'array'"));
        assert_eq!(err.raw, raw);
    }

    #[test]
    fn test_nameless_tool_call_fails_validation() {
        let raw = conversation_json(json!([{"arguments": {}}]));
        let err = ConversationParser::new().parse(&raw).unwrap_err();
        assert!(err.message.contains("toolCalls"));
    }

    #[test]
    fn test_bad_arguments_drop_only_that_call() {
        let raw = conversation_json(json!([
            {"name": "getWritingStructure", "arguments": null},
            {"name": "getKnowledgeTree", "arguments": {"request": "bees"}}
        ]));

        let response = ConversationParser::new().parse(&raw).unwrap();
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "getKnowledgeTree");
    }

    fn writing_json() -> Value {
        json!({
            "reasoning": "Three sections cover it",
            "messageToOperator": "Outline ready",
            "deliverables": {
                "writingStructureDraft": {
                    "sections": [
                        {"title": "Intro", "instructions": "Set the scene", "exampleContent": "Bees matter."},
                        {"title": "Body", "instructions": "Explain pollination", "exampleContent": "Flowers..."}
                    ]
                }
            }
        })
    }

    #[test]
    fn test_parse_writing_response() {
        let response = WritingParser::new().parse(&writing_json().to_string()).unwrap();
        assert_eq!(response.message_to_operator, "Outline ready");
        assert_eq!(response.deliverables.len(), 2);
        assert_eq!(response.deliverables[1].title, "Body");
    }

    #[test]
    fn test_round_trip_writing() {
        let original = WritingParser::new().parse(&writing_json().to_string()).unwrap();
        let reparsed = WritingParser::new().parse(&original.to_json().to_string()).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn test_writing_without_deliverables_defaults_empty() {
        let raw = r#"{"reasoning": "r", "messageToOperator": "m"}"#;
        let response = WritingParser::new().parse(raw).unwrap();
        assert!(response.deliverables.is_empty());
    }

    #[test]
    fn test_writing_section_missing_example_fails() {
        let mut value = writing_json();
        value["deliverables"]["writingStructureDraft"]["sections"][0]["exampleContent"] = json!("");
        let err = WritingParser::new().parse(&value.to_string()).unwrap_err();
        assert!(err.message.contains("deliverables"));
    }

    #[test]
    fn test_parse_response_by_kind() {
        let raw = conversation_json(json!([]));
        let parsed = parse_response(ResponseKind::Conversation, &raw).unwrap();
        assert!(matches!(parsed, StructuredResponse::Conversation(_)));
        assert!(parse_response(ResponseKind::Writing, &raw).is_err());
    }
}
