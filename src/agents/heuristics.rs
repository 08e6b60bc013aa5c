//! Model-free text heuristics used to build fallback results.

use std::collections::HashSet;

use crate::parser::normalize_whitespace;

/// Whitespace-separated words starting with an uppercase letter and longer
/// than `min_len` characters, stripped of trailing punctuation and
/// deduplicated in first-seen order.
pub fn capitalized_words(text: &str, min_len: usize, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split_whitespace()
        .filter(|word| word.chars().next().is_some_and(char::is_uppercase))
        .filter(|word| word.chars().count() > min_len)
        .map(|word| word.trim_matches(|c| matches!(c, '.' | ',' | '!' | '?')).to_string())
        .filter(|word| !word.is_empty() && seen.insert(word.clone()))
        .take(limit)
        .collect()
}

/// Sentences of the whitespace-normalized text, each ending at `.`, `!` or
/// `?` followed by whitespace (or the end of the text).
pub fn sentences(text: &str) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    let mut result = Vec::new();
    let mut current = String::new();
    let mut chars = normalized.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = chars.peek().map_or(true, |next| next.is_whitespace());
        if matches!(c, '.' | '!' | '?') && at_boundary {
            let sentence = current.trim();
            if !sentence.is_empty() {
                result.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        result.push(rest.to_string());
    }
    result
}

/// Leading whole sentences totalling at most `max_words` words. A first
/// sentence longer than that is cut to its first `max_words` words.
pub fn leading_summary(text: &str, max_words: usize) -> String {
    let mut picked: Vec<String> = Vec::new();
    let mut words = 0;

    for sentence in sentences(text) {
        let count = sentence.split_whitespace().count();
        if words + count > max_words {
            if picked.is_empty() {
                let cut: Vec<&str> = sentence.split_whitespace().take(max_words).collect();
                picked.push(cut.join(" "));
            }
            break;
        }
        words += count;
        picked.push(sentence);
    }

    picked.join(" ")
}

/// True when every cased character is uppercase and there is at least one.
pub fn is_upper_case(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}

/// Title case: each run of letters starts uppercase and continues lowercase.
pub fn is_title_case(line: &str) -> bool {
    let mut previous_cased = false;
    let mut any_cased = false;

    for c in line.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            any_cased = true;
        } else {
            previous_cased = false;
        }
    }

    any_cased
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalized_words() {
        let text = "The Mitochondria, the Ribosome and the Mitochondria. Also Cells!";
        assert_eq!(
            capitalized_words(text, 3, 10),
            vec!["Mitochondria", "Ribosome", "Also", "Cells"]
        );
        assert_eq!(capitalized_words(text, 4, 2), vec!["Mitochondria", "Ribosome"]);
    }

    #[test]
    fn test_sentences() {
        let text = "First one. Second\n one!  Version 1.5 ships? trailing";
        assert_eq!(
            sentences(text),
            vec!["First one.", "Second one!", "Version 1.5 ships?", "trailing"]
        );
    }

    #[test]
    fn test_leading_summary() {
        let text = "One two three. Four five. Six seven eight nine.";
        assert_eq!(leading_summary(text, 5), "One two three. Four five.");
        assert_eq!(leading_summary(text, 2), "One two");
        assert_eq!(leading_summary("", 10), "");
    }

    #[test]
    fn test_case_checks() {
        assert!(is_title_case("Cell Structure"));
        assert!(is_title_case("Chapter 1: Overview"));
        assert!(!is_title_case("Cell structure"));
        assert!(!is_title_case("CELL"));
        assert!(is_upper_case("INTRODUCTION 2"));
        assert!(!is_upper_case("Introduction"));
        assert!(!is_upper_case("123"));
    }
}
