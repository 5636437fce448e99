//! Lenient JSON recovery for text produced by generative services
//!
//! Handles markdown fences, prose around the object and payloads cut off
//! mid-stream (open strings, dangling commas or colons, unclosed brackets).

use serde_json::Value;

use crate::domain::RepairPath;

/// Removes a leading markdown code fence (optionally tagged `json`) and a trailing one.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    for opener in ["```json", "```JSON", "```"] {
        if let Some(rest) = text.strip_prefix(opener) {
            text = rest;
            break;
        }
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parses the first JSON value in `text`, ignoring anything after it.
pub fn parse_leading_value(text: &str) -> Option<Value> {
    let start = text.find(['{', '['])?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Value>()
        .next()
        .and_then(Result::ok)
}

/// Appends whatever is needed to close a truncated document.
///
/// Tracks string state and bracket nesting in one pass; an open string is
/// closed first, then a trailing comma is dropped or a dangling colon gets
/// `null`, then closers are appended innermost first.
pub fn balance_brackets(text: &str) -> String {
    let state = scan(text);
    let mut repaired = text.trim_end().to_string();

    if state.in_string {
        if state.pending_escape {
            repaired.pop();
        }
        repaired.push('"');
    }

    close_containers(repaired, &state.open)
}

/// Direct parse first, then bracket repair, then truncation to the last
/// complete member. `None` when nothing parses.
pub fn parse_lenient(raw: &str) -> Option<(Value, RepairPath)> {
    let text = strip_fences(raw);
    if text.is_empty() {
        return None;
    }

    if let Some(value) = parse_leading_value(text) {
        return Some((value, RepairPath::Direct));
    }

    let start = text.find(['{', '['])?;
    let body = &text[start..];

    if let Ok(value) = serde_json::from_str(&balance_brackets(body)) {
        return Some((value, RepairPath::BracketRepair));
    }

    // Drop the incomplete trailing member and close again
    let cut = scan(body).last_separator?;
    let head = &body[..cut];
    let repaired = close_containers(head.to_string(), &scan(head).open);
    serde_json::from_str(&repaired)
        .ok()
        .map(|value| (value, RepairPath::BracketRepair))
}

struct ScanState {
    open: Vec<char>,
    in_string: bool,
    pending_escape: bool,
    /// Byte offset of the last comma outside a string
    last_separator: Option<usize>,
}

fn scan(text: &str) -> ScanState {
    let mut state = ScanState {
        open: Vec::new(),
        in_string: false,
        pending_escape: false,
        last_separator: None,
    };

    for (offset, ch) in text.char_indices() {
        if state.in_string {
            if state.pending_escape {
                state.pending_escape = false;
            } else if ch == '\\' {
                state.pending_escape = true;
            } else if ch == '"' {
                state.in_string = false;
            }
            continue;
        }

        match ch {
            '"' => state.in_string = true,
            '{' | '[' => state.open.push(ch),
            '}' | ']' => {
                state.open.pop();
            }
            ',' => state.last_separator = Some(offset),
            _ => {}
        }
    }

    state
}

fn close_containers(mut repaired: String, open: &[char]) -> String {
    let trimmed_len = repaired.trim_end().len();
    repaired.truncate(trimmed_len);

    if repaired.ends_with(',') {
        repaired.pop();
    } else if repaired.ends_with(':') {
        repaired.push_str(" null");
    }

    for opener in open.iter().rev() {
        repaired.push(if *opener == '{' { '}' } else { ']' });
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("```json\n{\"a\": 1}\n```", "{\"a\": 1}")]
    #[case("```\n{\"a\": 1}```", "{\"a\": 1}")]
    #[case("  {\"a\": 1}  ", "{\"a\": 1}")]
    fn strips_markdown_fences(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip_fences(raw), expected);
    }

    #[rstest]
    #[case(r#"{"a": 40, "b": "ALTO""#, r#"{"a": 40, "b": "ALTO"}"#)]
    #[case(r#"{"a": [1, 2"#, r#"{"a": [1, 2]}"#)]
    #[case(r#"{"a": "cort"#, r#"{"a": "cort"}"#)]
    #[case(r#"{"a": 1,"#, r#"{"a": 1}"#)]
    #[case(r#"{"a":"#, r#"{"a": null}"#)]
    #[case(r#"{"a": "x}y", "b": [{"c": 1"#, r#"{"a": "x}y", "b": [{"c": 1}]}"#)]
    fn balances_truncated_documents(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(balance_brackets(input), expected);
    }

    #[test]
    fn leading_value_ignores_surrounding_prose() {
        let value = parse_leading_value("Claro, aquí está: {\"a\": 1} Saludos").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn lenient_parse_reports_path() {
        let (value, path) = parse_lenient("{\"a\": 1}").unwrap();
        assert_eq!(value, json!({"a": 1}));
        assert_eq!(path, RepairPath::Direct);

        let (value, path) = parse_lenient("{\"a\": 1, \"b\": [\"x\"").unwrap();
        assert_eq!(value, json!({"a": 1, "b": ["x"]}));
        assert_eq!(path, RepairPath::BracketRepair);
    }

    #[test]
    fn dangling_key_is_truncated_away() {
        let (value, path) = parse_lenient("{\"a\": 1, \"b\"").unwrap();
        assert_eq!(value, json!({"a": 1}));
        assert_eq!(path, RepairPath::BracketRepair);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("no hay json aquí")]
    #[case("{{{{")]
    fn garbage_yields_none(#[case] raw: &str) {
        assert!(parse_lenient(raw).is_none());
    }
}
