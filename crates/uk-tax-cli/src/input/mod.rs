pub mod file;
pub mod schedule;
pub mod stdin;

use serde::de::DeserializeOwned;
use serde_json::Value;

use uk_tax_core::TaxYearSchedule;

/// JSON request from `--input <file>` or piped stdin, if either was given.
pub fn read_request(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Some(file::read_json_value(p)?)),
        None => stdin::read_stdin(),
    }
}

/// Deserialise a request, filling in `schedule` from the command line when
/// the request does not carry its own.
pub fn parse_request<T: DeserializeOwned>(
    mut value: Value,
    schedule: &TaxYearSchedule,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Value::Object(map) = &mut value {
        if !map.contains_key("schedule") {
            map.insert("schedule".to_string(), serde_json::to_value(schedule)?);
        }
    }
    Ok(serde_json::from_value(value)?)
}
