//! Response normalization.
//!
//! The model is instructed to wrap its verdict JSON in a fenced code block,
//! but that is not guaranteed. This module strips the fencing when present
//! and parses the remainder; a parse failure collapses to `None` and is
//! never fatal to the process.

use serde_json::Value;

/// Coerce raw model output into a JSON value.
///
/// Returns `None` when the text is not valid JSON after fence stripping;
/// the offending text is logged. `Some(Value::Null)` means the model
/// literally returned the JSON value `null`.
pub fn parse_model_text(raw: &str) -> Option<Value> {
    let inner = strip_code_fence(raw);

    match serde_json::from_str(inner) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, text = %raw, "Model output is not valid JSON");
            None
        }
    }
}

/// Strip a leading ```` ```json ```` (or bare ```` ``` ````) marker and a
/// trailing ```` ``` ```` marker, when present.
fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"summary\":\"s\",\"decision\":\"d\",\"reasoning\":\"r\",\"winner\":\"w\",\"loser\":\"l\"}\n```";
        let value = parse_model_text(raw).expect("should parse");
        assert_eq!(value["winner"], json!("w"));
        assert_eq!(value["loser"], json!("l"));
    }

    #[test]
    fn parses_unfenced_json() {
        assert_eq!(parse_model_text("{\"a\": 1}"), Some(json!({"a": 1})));
    }

    #[test]
    fn parses_bare_fence_without_language_tag() {
        assert_eq!(parse_model_text("```\n[1, 2]\n```"), Some(json!([1, 2])));
    }

    #[test]
    fn tolerates_missing_trailing_newline() {
        assert_eq!(parse_model_text("```json\n{}```"), Some(json!({})));
    }

    #[test]
    fn literal_null_is_a_parsed_value() {
        assert_eq!(parse_model_text("null"), Some(Value::Null));
    }

    #[test]
    fn invalid_json_collapses_to_none() {
        assert_eq!(parse_model_text("the plaintiff wins"), None);
        assert_eq!(parse_model_text("```json\nnot json\n```"), None);
    }
}
