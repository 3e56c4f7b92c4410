//! Best-effort recovery of a JSON value from free-form model output.
//!
//! Order: fenced code block → first balanced `{...}` / `[...]` span that parses → `NoJsonFound`.
//! The span scan tracks nesting depth and string/escape state, so braces inside
//! string values never truncate a candidate.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::LlmError;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

/// Extracts the first JSON value found in `text`.
pub fn extract_json(text: &str) -> Result<Value, LlmError> {
    for caps in FENCED_BLOCK.captures_iter(text) {
        if let Some(inner) = caps.get(1) {
            if let Ok(value) = serde_json::from_str(inner.as_str().trim()) {
                return Ok(value);
            }
        }
    }

    for (start, c) in text.char_indices() {
        if c != '{' && c != '[' {
            continue;
        }
        if let Some(end) = balanced_end(&text[start..]) {
            if let Ok(value) = serde_json::from_str(&text[start..start + end]) {
                return Ok(value);
            }
        }
    }

    Err(LlmError::NoJsonFound)
}

/// Returns the byte length of the balanced span that opens at `s[0]`,
/// or `None` if it never closes or closes with the wrong delimiter.
fn balanced_end(s: &str) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_block_with_json_tag() {
        let value = extract_json("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_fenced_block_without_tag() {
        let value = extract_json("Here you go:\n```\n[1, 2, 3]\n```\nThanks").unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn test_inline_object_in_prose() {
        let value = extract_json("noise {\"a\":1} noise").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_no_json_found() {
        let err = extract_json("no json here").unwrap_err();
        assert!(matches!(err, LlmError::NoJsonFound));
    }

    #[test]
    fn test_braces_inside_strings_do_not_truncate() {
        let text = r#"Result: {"note": "use { and } freely", "n": 2} -- done"#;
        let value = extract_json(text).unwrap();
        assert_eq!(value["note"], "use { and } freely");
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"quote": "she said \"hi {\" twice"}"#;
        let value = extract_json(text).unwrap();
        assert_eq!(value["quote"], "she said \"hi {\" twice");
    }

    #[test]
    fn test_skips_unparseable_span_and_finds_later_one() {
        let text = r#"set {x} then {"ok": true}"#;
        let value = extract_json(text).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn test_nested_structures() {
        let text = r#"prefix {"outer": {"inner": [1, {"deep": "]"}]}} suffix"#;
        let value = extract_json(text).unwrap();
        assert_eq!(value["outer"]["inner"][1]["deep"], "]");
    }

    #[test]
    fn test_unclosed_object_is_not_json() {
        let err = extract_json(r#"{"a": 1"#).unwrap_err();
        assert!(matches!(err, LlmError::NoJsonFound));
    }

    #[test]
    fn test_balanced_end_rejects_mismatched_closer() {
        assert_eq!(balanced_end("{]"), None);
        assert_eq!(balanced_end("[1]tail"), Some(3));
    }
}
