use serde_json::Value;

use super::scalar_text;

/// Headline figure for each command, most specific first.
const HEADLINE_KEYS: [&str; 10] = [
    "saving",
    "total_tax",
    "net_pay",
    "income_tax",
    "dividend_tax",
    "contribution",
    "relief",
    "tax",
    "taxable_income",
    "tax_year",
];

/// Print only the headline number, for shell pipelines.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result {
        for key in HEADLINE_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                println!("{}", scalar_text(val));
                return;
            }
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, scalar_text(val));
            return;
        }
    }

    println!("{}", scalar_text(result));
}
