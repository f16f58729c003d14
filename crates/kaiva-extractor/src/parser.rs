//! Parse LLM output into a field mapping
//!
//! The model is asked for a dictionary but may answer in Python literal
//! syntax, strict JSON, or either wrapped in a markdown fence. Each dialect
//! is a named strategy; strategies run once each, in order, and the first
//! one that yields a mapping wins.

use crate::error::ExtractorError;
use crate::literal::parse_literal;
use crate::types::ReplyMap;
use kaiva_domain::NOT_STATED;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// One way of reading reply text
pub struct ParseStrategy {
    /// Name used in logs
    pub name: &'static str,
    /// Pure text → value conversion
    pub parse: fn(&str) -> Result<Value, String>,
}

/// Strategies in the order they are attempted
pub const STRATEGIES: &[ParseStrategy] = &[
    ParseStrategy {
        name: "literal",
        parse: parse_literal,
    },
    ParseStrategy {
        name: "strict_json",
        parse: parse_strict_json,
    },
    ParseStrategy {
        name: "unfenced_literal",
        parse: parse_unfenced_literal,
    },
];

/// Parse a raw model reply into a key → value mapping
///
/// # Errors
///
/// Returns `ExtractorError::UnparseableReply` when no strategy yields a
/// mapping; the message carries the last strategy's complaint.
pub fn parse_llm_response(response: &str) -> Result<ReplyMap, ExtractorError> {
    let mut last_failure = String::from("no parsing strategy configured");

    for strategy in STRATEGIES {
        match (strategy.parse)(response) {
            Ok(Value::Object(map)) => {
                debug!(strategy = strategy.name, keys = map.len(), "Parsed model reply");
                return Ok(into_reply_map(map));
            }
            Ok(other) => {
                warn!(
                    strategy = strategy.name,
                    shape = shape_name(&other),
                    "Reply parsed but is not a mapping"
                );
                last_failure = format!("reply is {}, not a mapping", shape_name(&other));
            }
            Err(e) => {
                warn!(strategy = strategy.name, error = %e, "Parse strategy failed");
                last_failure = format!("{}: {}", strategy.name, e);
            }
        }
    }

    Err(ExtractorError::UnparseableReply(last_failure))
}

fn parse_strict_json(text: &str) -> Result<Value, String> {
    serde_json::from_str(text).map_err(|e| e.to_string())
}

fn parse_unfenced_literal(text: &str) -> Result<Value, String> {
    parse_literal(strip_decorations(text))
}

/// Fence language tags dropped in front of the structure
const LANGUAGE_TAGS: &[&str] = &["python", "py", "json"];

/// Remove markdown fences and a leading language tag such as `python`
pub fn strip_decorations(text: &str) -> &str {
    let mut cleaned = text.trim();

    if let Some(inner) = cleaned.strip_prefix("```") {
        cleaned = match inner.find("```") {
            Some(end) => &inner[..end],
            None => inner,
        };
    } else if let Some(inner) = cleaned.strip_suffix("```") {
        cleaned = inner;
    }
    cleaned = cleaned.trim();

    for tag in LANGUAGE_TAGS {
        let Some(after_tag) = strip_prefix_ignore_case(cleaned, tag) else {
            continue;
        };
        let after_tag = after_tag.trim_start();
        if after_tag.starts_with(['{', '[', '(']) {
            cleaned = after_tag;
            break;
        }
    }

    cleaned.trim()
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

fn into_reply_map(map: Map<String, Value>) -> ReplyMap {
    map.into_iter()
        .map(|(key, value)| (key, render_value(&value)))
        .collect()
}

/// Render a parsed value as the text stored in the result
///
/// Strings are kept verbatim. `None`/`null` means the model had nothing to
/// report. Lists are joined with `; ` so a multi-part answer stays on one
/// row.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => NOT_STATED.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join("; "),
        Value::Object(_) => value.to_string(),
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
