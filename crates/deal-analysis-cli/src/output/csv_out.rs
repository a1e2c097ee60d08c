use serde_json::{Map, Value};
use std::io;

use super::{cell, is_record_list};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// A result holding a yearly schedule is written as that schedule (the
/// `projections` table for a deal, the `schedule` for debt service); any
/// other result becomes `field,value` rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            match primary_records(body) {
                Some(records) => write_records(&mut wtr, records),
                None => write_fields(&mut wtr, body),
            }
        }
        Value::Array(arr) => write_records(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([cell(value)]);
        }
    }

    let _ = wtr.flush();
}

fn primary_records(body: &Map<String, Value>) -> Option<&Vec<Value>> {
    ["projections", "schedule"]
        .into_iter()
        .filter_map(|key| body.get(key))
        .find(|v| is_record_list(v))
        .and_then(Value::as_array)
}

fn write_fields(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &cell(val)]);
    }
}

fn write_records(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([cell(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);
    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(cell).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}
