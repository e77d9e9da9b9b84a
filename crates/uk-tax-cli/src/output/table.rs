use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_fields, object_arrays, scalar_text};

/// Render a computation envelope as tables: the flattened result first, then
/// one table per list of records (band breakdowns, recommendations), then
/// warnings and methodology.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                print_fields(result);
                for (name, rows) in object_arrays(result) {
                    println!("\n{name}:");
                    print_records(rows);
                }
                print_footer(map);
            }
            _ => print_fields(map),
        },
        Value::Array(arr) => print_records(arr),
        _ => println!("{}", value),
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten_fields(map) {
        builder.push_record([key, scalar_text(&val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_records(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<String> = flatten_fields(first).into_iter().map(|(k, _)| k).collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        if let Value::Object(map) = row {
            let cells = flatten_fields(map);
            let line: Vec<String> = headers
                .iter()
                .map(|h| {
                    cells
                        .iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| scalar_text(v))
                        .unwrap_or_default()
                })
                .collect();
            builder.push_record(line);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
