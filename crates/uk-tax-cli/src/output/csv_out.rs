use serde_json::Value;
use std::io;

use super::{flatten_fields, object_arrays, scalar_text};

/// Two-column `field,value` CSV of the flattened result. With `--output csv`
/// on the optimiser, recommendations follow as a second block.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = match value {
        Value::Object(map) => map.get("result").unwrap_or(value),
        _ => value,
    };

    match result {
        Value::Object(map) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in flatten_fields(map) {
                let _ = wtr.write_record([key, scalar_text(&val)]);
            }
            for (name, rows) in object_arrays(map) {
                for (i, row) in rows.iter().enumerate() {
                    if let Value::Object(fields) = row {
                        for (key, val) in flatten_fields(fields) {
                            let _ = wtr.write_record([format!("{name}[{i}].{key}"), scalar_text(&val)]);
                        }
                    }
                }
            }
        }
        other => {
            let _ = wtr.write_record([scalar_text(other)]);
        }
    }

    let _ = wtr.flush();
}
