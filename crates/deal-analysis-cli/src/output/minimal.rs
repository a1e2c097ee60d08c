use serde_json::Value;

use super::cell;

/// Headline fields, most specific first. `mna analyze` prints its recommendation.
const PRIORITY_KEYS: [&str; 8] = [
    "recommendation",
    "irr",
    "moic",
    "enterprise_value",
    "npv",
    "years",
    "total_payment",
    "base_valuation",
];

/// Print just the key answer from the output envelope.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                println!("{}", cell(val));
                return;
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{key}: {}", cell(val));
            return;
        }
    }

    println!("{}", cell(result_obj));
}
