//! Field-by-field schema validation for decoded responses.
//!
//! Every rule is checked and every violation is collected; validation never
//! stops at the first problem.

use serde_json::{Map, Value};

use super::cleanup::value_kind;

/// Expected JSON kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A custom predicate with a description used in violation messages
#[derive(Clone, Copy)]
pub struct Check {
    pub description: &'static str,
    pub test: fn(&Value) -> bool,
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check").field("description", &self.description).finish()
    }
}

/// Rule for a single top-level field
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub check: Option<Check>,
}

impl FieldRule {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            check: None,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            check: None,
        }
    }

    pub fn with_check(mut self, description: &'static str, test: fn(&Value) -> bool) -> Self {
        self.check = Some(Check { description, test });
        self
    }
}

/// Declared shape of a response object
#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: Vec<FieldRule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Check `data` against every rule, returning all violations.
    ///
    /// A `null` value counts as absent.
    pub fn validate(&self, data: &Map<String, Value>) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        for rule in &self.rules {
            let value = match data.get(rule.name) {
                None | Some(Value::Null) => {
                    if rule.required {
                        violations.push(format!("Required field '{}' is missing", rule.name));
                    }
                    continue;
                }
                Some(value) => value,
            };

            if !rule.kind.matches(value) {
                violations.push(format!(
                    "Field '{}' should be of type '{}', but got '{}'",
                    rule.name,
                    rule.kind,
                    value_kind(value)
                ));
                continue;
            }

            if let Some(check) = &rule.check
                && !(check.test)(value)
            {
                violations.push(format!(
                    "Field '{}' failed custom validation: {}",
                    rule.name, check.description
                ));
            }
        }

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn all_positive(value: &Value) -> bool {
        value
            .as_array()
            .is_some_and(|items| items.iter().all(|n| n.as_i64().is_some_and(|n| n > 0)))
    }

    fn schema() -> Schema {
        Schema::new()
            .field(FieldRule::required("name", FieldKind::String))
            .field(FieldRule::required("count", FieldKind::Number))
            .field(FieldRule::optional("ids", FieldKind::Array).with_check("ids must be positive", all_positive))
    }

    #[test]
    fn test_valid_data() {
        let data = object(json!({"name": "a", "count": 2, "ids": [1, 2]}));
        assert!(schema().validate(&data).is_ok());
    }

    #[test]
    fn test_optional_field_may_be_absent_or_null() {
        assert!(schema().validate(&object(json!({"name": "a", "count": 1}))).is_ok());
        assert!(schema().validate(&object(json!({"name": "a", "count": 1, "ids": null}))).is_ok());
    }

    #[test]
    fn test_collects_every_violation() {
        let data = object(json!({"count": "two", "ids": [1, -1]}));
        let violations = schema().validate(&data).unwrap_err();

        assert_eq!(violations.len(), 3);
        assert_eq!(violations[0], "Required field 'name' is missing");
        assert_eq!(violations[1], "Field 'count' should be of type 'number', but got 'string'");
        assert_eq!(violations[2], "Field 'ids' failed custom validation: ids must be positive");
    }

    #[test]
    fn test_required_null_is_missing() {
        let data = object(json!({"name": null, "count": 1}));
        let violations = schema().validate(&data).unwrap_err();
        assert_eq!(violations, vec!["Required field 'name' is missing".to_string()]);
    }

    #[test]
    fn test_check_skipped_on_kind_mismatch() {
        let data = object(json!({"name": "a", "count": 1, "ids": "1,2"}));
        let violations = schema().validate(&data).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("should be of type 'array'"));
    }

    #[test]
    fn test_field_kind_matches() {
        assert!(FieldKind::Boolean.matches(&json!(true)));
        assert!(FieldKind::Object.matches(&json!({})));
        assert!(!FieldKind::Object.matches(&json!([])));
        assert!(!FieldKind::Number.matches(&json!("1")));
    }
}
