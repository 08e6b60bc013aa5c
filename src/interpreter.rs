//! Recovery of structured JSON from free-form model replies.
//!
//! Models routinely wrap their JSON in prose or markdown fences, so the
//! interpreter looks for the widest `{...}` span first, then the widest
//! `[...]` span, and only then tries the reply as a whole. Anything that
//! still fails to parse becomes an [`InterpreterFailure`], never a panic or
//! an error the caller has to unwind.

use serde_json::{json, Value};
use std::fmt;

/// Why a model reply could not be turned into JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterFailure {
    pub error: String,
    pub raw_response: String,
}

impl InterpreterFailure {
    pub fn new(error: impl Into<String>, raw_response: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            raw_response: raw_response.into(),
        }
    }

    /// The `{error, raw_response, success: false}` mapping handed to
    /// consumers that only understand untyped JSON.
    pub fn to_sentinel(&self) -> Value {
        json!({
            "error": self.error,
            "raw_response": self.raw_response,
            "success": false,
        })
    }
}

impl fmt::Display for InterpreterFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

/// Outcome of interpreting a model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    Parsed(Value),
    Failed(InterpreterFailure),
}

impl Interpretation {
    pub fn is_success(&self) -> bool {
        matches!(self, Interpretation::Parsed(_))
    }

    pub fn into_result(self) -> Result<Value, InterpreterFailure> {
        match self {
            Interpretation::Parsed(value) => Ok(value),
            Interpretation::Failed(failure) => Err(failure),
        }
    }

    /// Untyped view: the parsed value, or the failure sentinel.
    pub fn to_value(&self) -> Value {
        match self {
            Interpretation::Parsed(value) => value.clone(),
            Interpretation::Failed(failure) => failure.to_sentinel(),
        }
    }
}

/// Parse a raw model reply into JSON.
pub fn interpret_json(raw: &str) -> Interpretation {
    let candidates = [
        greedy_span(raw, '{', '}'),
        greedy_span(raw, '[', ']'),
        Some(raw.trim()),
    ];

    let mut last_error = String::from("empty response");
    for candidate in candidates.into_iter().flatten() {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) if reports_failure(&value) => {
                let error = value
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("model reported failure")
                    .to_string();
                return Interpretation::Failed(InterpreterFailure::new(error, raw));
            }
            Ok(value) => return Interpretation::Parsed(value),
            Err(e) => last_error = e.to_string(),
        }
    }

    Interpretation::Failed(InterpreterFailure::new(
        format!("Failed to parse JSON: {}", last_error),
        raw,
    ))
}

/// Slice from the first `open` to the last `close`, inclusive.
fn greedy_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn reports_failure(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool) == Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prose_fails() {
        let result = interpret_json("not json at all");
        assert!(!result.is_success());
        assert_eq!(result.to_value()["success"], json!(false));
        assert_eq!(result.to_value()["raw_response"], json!("not json at all"));
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let result = interpret_json("here is the answer: {\"a\":1} thanks");
        assert_eq!(result, Interpretation::Parsed(json!({"a": 1})));
    }

    #[test]
    fn test_code_fenced_object() {
        let raw = "```json\n{\"questions\": [{\"question\": \"Q1\"}]}\n```";
        let value = interpret_json(raw).into_result().unwrap();
        assert_eq!(value["questions"][0]["question"], "Q1");
    }

    #[test]
    fn test_array_of_objects() {
        let raw = "Cards:\n[{\"question\": \"A\"}, {\"question\": \"B\"}]";
        let value = interpret_json(raw).into_result().unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_bare_string_array() {
        let value = interpret_json("[\"one\", \"two\"]").into_result().unwrap();
        assert_eq!(value, json!(["one", "two"]));
    }

    #[test]
    fn test_reported_failure_is_failure() {
        let result = interpret_json("{\"success\": false, \"error\": \"quota\"}");
        match result {
            Interpretation::Failed(failure) => assert_eq!(failure.error, "quota"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_reversed_braces() {
        assert!(!interpret_json("} nothing here {").is_success());
    }

    #[test]
    fn test_empty_reply() {
        assert!(!interpret_json("").is_success());
    }
}
