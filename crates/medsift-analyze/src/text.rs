//! Text extraction from semi-structured payloads.

use serde_json::Value;

/// Flatten a payload into one text blob for lexical analysis.
///
/// Recursively collects every string in encounter order and joins with a
/// single space. Numbers, booleans and nulls are ignored. Object keys are
/// visited in insertion order (`serde_json` is built with `preserve_order`),
/// so n-gram boundaries are reproducible across runs.
pub fn extract_text(value: &Value) -> String {
    let mut parts: Vec<&str> = Vec::new();
    collect_strings(value, &mut parts);
    parts.join(" ")
}

fn collect_strings<'a>(value: &'a Value, parts: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => parts.push(s),
        Value::Object(map) => {
            for v in map.values() {
                collect_strings(v, parts);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_strings(item, parts);
            }
        }
        _ => {}
    }
}
