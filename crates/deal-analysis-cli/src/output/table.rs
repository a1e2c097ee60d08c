use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, is_record_list};

/// Format output as tables: scalar result fields first, then one table per
/// yearly schedule (projections, amortisation, ...).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                print_result(result);
                print_envelope_notes(map);
            }
            _ => print_fields(map),
        },
        Value::Array(arr) => print_records(arr),
        _ => println!("{value}"),
    }
}

fn print_result(result: &Map<String, Value>) {
    let (lists, fields): (Vec<_>, Vec<_>) = result.iter().partition(|(_, v)| is_record_list(v));

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key.as_str(), &cell(val)]);
    }
    println!("{}", Table::from(builder));

    for (key, val) in lists {
        if let Value::Array(records) = val {
            println!("\n{key}:");
            print_records(records);
        }
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &cell(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_records(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", cell(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(h).map(cell).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}
