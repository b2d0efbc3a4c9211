//! Response parsing and schema validation
//!
//! Raw model text goes through best-effort cleanup, JSON decoding, schema
//! validation (all violations collected), and tool-call normalization.

mod cleanup;
mod parser;
mod response;
mod schema;

pub use cleanup::{clean_json, decode_object, value_kind};
pub use parser::{ConversationParser, ParseError, ResponseKind, ResponseParser, WritingParser, parse_response};
pub use response::{ConversationResponse, SectionOutline, StructuredResponse, ToolCall, WritingResponse};
pub use schema::{Check, FieldKind, FieldRule, Schema};
