//! JSON rendering.

use crate::db::{QueryResult, Value};
use crate::error::{ExportError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::HashSet;

/// Renders the rows as a pretty-printed array of objects keyed by column name.
///
/// Keys keep the column order of the result set. A repeated column name gets
/// a `_2`, `_3`, ... suffix so no field is dropped. An empty result renders `[]`.
pub fn render(result: &QueryResult) -> Result<Vec<u8>> {
    let keys = unique_keys(&result.column_names());

    let records: Vec<JsonValue> = result
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, JsonValue> = keys
                .iter()
                .zip(row)
                .map(|(key, value)| (key.clone(), to_json(value)))
                .collect();
            JsonValue::Object(object)
        })
        .collect();

    serde_json::to_vec_pretty(&records)
        .map_err(|e| ExportError::serialize(format!("Failed to serialize JSON: {e}")))
}

/// Returns one distinct object key per column.
fn unique_keys(names: &[&str]) -> Vec<String> {
    let originals: HashSet<&str> = names.iter().copied().collect();
    let mut used: HashSet<String> = HashSet::with_capacity(names.len());

    names
        .iter()
        .map(|name| {
            let key = if used.contains(*name) {
                (2..)
                    .map(|n| format!("{name}_{n}"))
                    .find(|k| !used.contains(k) && !originals.contains(k.as_str()))
                    .unwrap_or_else(|| name.to_string())
            } else {
                name.to_string()
            };
            used.insert(key.clone());
            key
        })
        .collect()
}

fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::Number((*i).into()),
        // JSON has no NaN or infinity
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(f.to_string())),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Bytes(b) => JsonValue::String(BASE64.encode(b)),
    }
}
