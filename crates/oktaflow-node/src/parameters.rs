//! Resolved node parameters for one input item.
//!
//! The host evaluates expressions before handing parameters over, so every
//! value here is plain JSON. Collections (`filters`, `additionalFields`,
//! `updateFields`, ...) are JSON objects whose absent entries were simply
//! never filled in by the user.

use serde_json::{Map, Value};

use crate::error::NodeError;

/// Page size used for `limit` when the user left it at its default.
pub const DEFAULT_RESULT_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Map<String, Value>,
}

impl Parameters {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Accepts the host's parameter object; anything else is rejected.
    pub fn from_json(value: Value) -> Result<Self, NodeError> {
        match value {
            Value::Object(values) => Ok(Self::new(values)),
            Value::Null => Ok(Self::default()),
            other => Err(NodeError::invalid_parameter(
                "parameters",
                format!("expected an object, got {}", type_name(&other)),
            )),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_owned(), value.into());
        self
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    /// Required scalar rendered as a string. An empty string is returned as-is.
    pub fn string(&self, name: &str) -> Result<String, NodeError> {
        let value = self
            .value(name)
            .ok_or_else(|| NodeError::MissingParameter(name.to_owned()))?;
        scalar_to_string(value)
            .ok_or_else(|| NodeError::invalid_parameter(name, "expected a string"))
    }

    /// Optional scalar; empty strings count as unset.
    pub fn optional_string(&self, name: &str) -> Option<String> {
        self.value(name)
            .and_then(scalar_to_string)
            .filter(|value| !value.is_empty())
    }

    /// Scalar rendered as a string, or `default` when the parameter is unset.
    pub fn string_or(&self, name: &str, default: &str) -> String {
        self.value(name)
            .and_then(scalar_to_string)
            .unwrap_or_else(|| default.to_owned())
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        match self.value(name) {
            Some(Value::Bool(value)) => *value,
            Some(Value::String(value)) => value == "true",
            _ => default,
        }
    }

    /// Required number, kept as JSON so integers stay integers in request bodies.
    pub fn number(&self, name: &str) -> Result<Value, NodeError> {
        match self.value(name) {
            Some(Value::Number(number)) => Ok(Value::Number(number.clone())),
            Some(Value::String(text)) => text
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| text.trim().parse::<f64>().map(Value::from))
                .map_err(|_| NodeError::invalid_parameter(name, "expected a number")),
            Some(_) => Err(NodeError::invalid_parameter(name, "expected a number")),
            None => Err(NodeError::MissingParameter(name.to_owned())),
        }
    }

    pub fn number_or(&self, name: &str, default: i64) -> Result<Value, NodeError> {
        match self.value(name) {
            None => Ok(Value::from(default)),
            Some(_) => self.number(name),
        }
    }

    /// A list of strings; a comma-separated string is accepted too. Missing is empty.
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, NodeError> {
        match self.value(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    scalar_to_string(item)
                        .ok_or_else(|| NodeError::invalid_parameter(name, "expected a list of strings"))
                })
                .collect(),
            Some(Value::String(text)) => Ok(split_list(text)),
            Some(_) => Err(NodeError::invalid_parameter(name, "expected a list of strings")),
        }
    }

    /// JSON-object parameter such as `additionalFields`. Missing is empty.
    pub fn collection(&self, name: &str) -> Result<Fields, NodeError> {
        match self.value(name) {
            None => Ok(Fields::default()),
            Some(Value::Object(values)) => Ok(Fields::new(values.clone())),
            Some(other) => Err(NodeError::invalid_parameter(
                name,
                format!("expected an object, got {}", type_name(other)),
            )),
        }
    }

    /// `returnAll` set means no limit; otherwise `limit` (default 50, minimum 1).
    pub fn collection_limit(&self) -> Result<Option<usize>, NodeError> {
        if self.bool_or("returnAll", false) {
            return Ok(None);
        }
        let Some(limit) = self.value("limit") else {
            return Ok(Some(DEFAULT_RESULT_LIMIT));
        };
        let limit = match limit {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse::<u64>().ok(),
            _ => None,
        }
        .filter(|limit| *limit >= 1)
        .ok_or_else(|| NodeError::invalid_parameter("limit", "expected a positive integer"))?;
        Ok(Some(usize::try_from(limit).unwrap_or(usize::MAX)))
    }
}

/// Optional fields of a collection parameter.
///
/// Lookups follow the host's truthiness: empty strings, `0`, `false` and
/// `null` read as "not set" through [`Fields::text`] and [`Fields::truthy`];
/// [`Fields::present`] only rejects absent and `null` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: Map<String, Value>,
}

impl Fields {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn truthy(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| is_truthy(value))
    }

    pub fn present(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.truthy(name).and_then(scalar_to_string)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

/// Splits a comma-separated list, trimming every entry.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',').map(|entry| entry.trim().to_owned()).collect()
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(value) => *value,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        Parameters::from_json(value).expect("parameters are an object")
    }

    #[test]
    fn required_string_reports_missing_name() {
        let error = params(json!({})).string("userId").expect_err("must fail");

        assert_eq!(error, NodeError::MissingParameter(String::from("userId")));
    }

    #[test]
    fn numbers_are_accepted_where_strings_are_expected() {
        assert_eq!(params(json!({ "priority": 2 })).string("priority"), Ok(String::from("2")));
    }

    #[test]
    fn defaults_apply_only_when_unset() {
        let params = params(json!({ "consent": "REQUIRED", "description": "" }));

        assert_eq!(params.string_or("consent", "IMPLICIT"), "REQUIRED");
        assert_eq!(params.string_or("claimType", "RESOURCE"), "RESOURCE");
        assert_eq!(params.string_or("description", "x"), "");
        assert_eq!(params.number_or("priority", 1), Ok(json!(1)));
    }

    #[test]
    fn numeric_text_is_parsed() {
        assert_eq!(params(json!({ "priority": "3" })).number("priority"), Ok(json!(3)));
        assert!(params(json!({ "priority": "high" })).number("priority").is_err());
    }

    #[test]
    fn return_all_disables_the_limit() {
        let params = params(json!({ "returnAll": true, "limit": 5 }));

        assert_eq!(params.collection_limit(), Ok(None));
    }

    #[test]
    fn limit_defaults_to_fifty() {
        assert_eq!(params(json!({})).collection_limit(), Ok(Some(DEFAULT_RESULT_LIMIT)));
        assert_eq!(params(json!({ "limit": 7 })).collection_limit(), Ok(Some(7)));
    }

    #[test]
    fn zero_or_negative_limit_is_rejected() {
        assert!(params(json!({ "limit": 0 })).collection_limit().is_err());
        assert!(params(json!({ "limit": -3 })).collection_limit().is_err());
    }

    #[test]
    fn missing_collection_is_empty() {
        let fields = params(json!({})).collection("filters").expect("empty collection");

        assert!(fields.is_empty());
    }

    #[test]
    fn field_truthiness_matches_host_semantics() {
        let fields = params(json!({ "filters": { "q": "", "status": "ACTIVE", "n": 0, "d": "" } }))
            .collection("filters")
            .expect("collection");

        assert_eq!(fields.text("q"), None);
        assert_eq!(fields.text("status").as_deref(), Some("ACTIVE"));
        assert!(fields.truthy("n").is_none());
        assert_eq!(fields.present("d"), Some(&json!("")));
        assert_eq!(fields.present("missing"), None);
    }

    #[test]
    fn string_list_accepts_arrays_and_comma_text() {
        let params = params(json!({ "a": ["x", "y"], "b": "x, y ,z" }));

        assert_eq!(params.string_list("a"), Ok(vec![String::from("x"), String::from("y")]));
        assert_eq!(
            params.string_list("b"),
            Ok(vec![String::from("x"), String::from("y"), String::from("z")])
        );
        assert_eq!(params.string_list("c"), Ok(Vec::new()));
    }

    #[test]
    fn non_object_parameters_are_rejected() {
        assert!(Parameters::from_json(json!([1, 2])).is_err());
    }
}
