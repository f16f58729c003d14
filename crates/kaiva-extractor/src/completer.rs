//! Reconcile a parsed reply with the field schema

use crate::types::ReplyMap;
use kaiva_domain::{ExtractionResult, FieldSchema, NOT_STATED};

/// Produce a result with exactly the schema's fields, in schema order
///
/// Values present in `reply` are copied unchanged; missing fields get the
/// `"Not Stated"` sentinel; keys outside the schema are dropped.
pub fn complete(schema: &FieldSchema, reply: &ReplyMap) -> ExtractionResult {
    let entries = schema
        .iter()
        .map(|field| {
            let value = reply
                .get(field)
                .cloned()
                .unwrap_or_else(|| NOT_STATED.to_string());
            (field.to_string(), value)
        })
        .collect();

    ExtractionResult::new(entries)
}

/// Reply keys that are not schema fields, sorted
pub fn unknown_keys<'a>(schema: &FieldSchema, reply: &'a ReplyMap) -> Vec<&'a str> {
    let mut keys: Vec<&str> = reply
        .keys()
        .map(String::as_str)
        .filter(|key| !schema.contains(key))
        .collect();
    keys.sort_unstable();
    keys
}
