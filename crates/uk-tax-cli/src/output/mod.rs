pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Nested objects become dotted keys (`current.total_tax`). Arrays of
/// objects are left for the caller to render as their own table.
pub(crate) fn flatten_fields(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut rows = Vec::new();
    push_fields("", map, &mut rows);
    rows
}

fn push_fields(prefix: &str, map: &Map<String, Value>, rows: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => push_fields(&name, inner, rows),
            Value::Array(items) if items.iter().any(Value::is_object) => {}
            _ => rows.push((name, val.clone())),
        }
    }
}

/// Arrays of objects inside a result, e.g. `recommendations` or `breakdown`.
pub(crate) fn object_arrays(map: &Map<String, Value>) -> Vec<(&str, &[Value])> {
    map.iter()
        .filter_map(|(key, val)| match val {
            Value::Array(items) if items.iter().any(Value::is_object) => {
                Some((key.as_str(), items.as_slice()))
            }
            _ => None,
        })
        .collect()
}

pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
