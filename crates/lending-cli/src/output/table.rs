use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Render output as tables: scalar result fields first, then one table per
/// list of rows (schedule, options, overdue, breakdowns).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                print_object_tables(result);
                print_envelope_notes(map);
            }
            _ => print_object_tables(map),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_object_tables(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sections = Vec::new();

    for (key, val) in map {
        match val {
            Value::Array(rows) if is_row_list(rows) => sections.push((key, rows)),
            Value::Object(inner) => {
                for (sub, sub_val) in inner {
                    builder.push_record([format!("{key}.{sub}"), format_value(sub_val)]);
                }
            }
            _ => builder.push_record([key.clone(), format_value(val)]),
        }
    }

    println!("{}", Table::from(builder));
    for (key, rows) in sections {
        println!("\n{}:", key);
        print_rows(rows);
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::Object(usd)) = envelope.get("usd_equivalent") {
        println!("\nUSD equivalent:");
        for (key, val) in usd {
            println!("  {}: {}", key, format_value(val));
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn is_row_list(arr: &[Value]) -> bool {
    !arr.is_empty() && arr.iter().all(Value::is_object)
}

fn print_rows(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        if arr.is_empty() {
            println!("(none)");
        }
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for map in arr.iter().filter_map(Value::as_object) {
        builder.push_record(
            headers
                .iter()
                .map(|h| map.get(h).map(format_value).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
