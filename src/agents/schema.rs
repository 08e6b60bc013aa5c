//! Field accessors that apply defaults while reading loosely shaped model
//! output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Difficulty shared by flashcards, quiz questions and practice problems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::parse(s).ok_or_else(|| format!("unknown difficulty: {}", s))
    }
}

/// Difficulty read from `key`, coerced to medium when missing or unknown.
pub fn difficulty_or_medium(value: &Value, key: &str) -> Difficulty {
    value
        .get(key)
        .and_then(Value::as_str)
        .and_then(Difficulty::parse)
        .unwrap_or_default()
}

/// Render a scalar as text. Objects, arrays and null have no text form.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn str_or(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(scalar_text)
        .unwrap_or_else(|| default.to_string())
}

/// List of strings under `key`. A bare string counts as a one-item list and
/// non-scalar elements are dropped.
pub fn string_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

pub fn string_list_or(value: &Value, key: &str, default: &[&str]) -> Vec<String> {
    let list = string_list(value, key);
    if list.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        list
    }
}

/// Number under `key`. Numeric strings, with or without a trailing `%`, are
/// accepted.
pub fn number(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

/// Like [`number`], clamped at zero and floored.
pub fn u32_or(value: &Value, key: &str, default: u32) -> u32 {
    number(value, key)
        .map(|n| n.max(0.0).floor().min(u32::MAX as f64) as u32)
        .unwrap_or(default)
}

/// Objects of the array under `key`, paired with their position in the
/// original array.
pub fn objects<'a>(value: &'a Value, key: &str) -> Vec<(usize, &'a Value)> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| object_items(items))
        .unwrap_or_default()
}

pub fn object_items(items: &[Value]) -> Vec<(usize, &Value)> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_object())
        .collect()
}

/// Non-empty array under `key`.
pub fn non_empty_array<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value
        .get(key)
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
}

/// At most `max` characters of `text`, cut on a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_str_or() {
        let value = json!({"a": "x", "b": 3, "c": null, "d": {"k": 1}});
        assert_eq!(str_or(&value, "a", "def"), "x");
        assert_eq!(str_or(&value, "b", "def"), "3");
        assert_eq!(str_or(&value, "c", "def"), "def");
        assert_eq!(str_or(&value, "d", "def"), "def");
        assert_eq!(str_or(&value, "missing", "def"), "def");
    }

    #[test]
    fn test_string_list() {
        let value = json!({"list": ["a", 1, {"x": 1}], "one": "solo", "blank": " "});
        assert_eq!(string_list(&value, "list"), vec!["a", "1"]);
        assert_eq!(string_list(&value, "one"), vec!["solo"]);
        assert!(string_list(&value, "blank").is_empty());
        assert_eq!(string_list_or(&value, "missing", &["A", "B"]), vec!["A", "B"]);
    }

    #[test]
    fn test_numbers() {
        let value = json!({"n": 12.7, "s": "85%", "neg": -4, "bad": "lots"});
        assert_eq!(u32_or(&value, "n", 0), 12);
        assert_eq!(u32_or(&value, "s", 0), 85);
        assert_eq!(u32_or(&value, "neg", 9), 0);
        assert_eq!(u32_or(&value, "bad", 9), 9);
    }

    #[test]
    fn test_difficulty_coercion() {
        let value = json!({"a": "HARD", "b": "impossible"});
        assert_eq!(difficulty_or_medium(&value, "a"), Difficulty::Hard);
        assert_eq!(difficulty_or_medium(&value, "b"), Difficulty::Medium);
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert!("trivial".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_objects_keep_original_index() {
        let value = json!({"items": ["skip", {"id": 1}, 3, {"id": 2}]});
        let found: Vec<usize> = objects(&value, "items").into_iter().map(|(i, _)| i).collect();
        assert_eq!(found, vec![1, 3]);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
