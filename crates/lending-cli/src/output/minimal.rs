use serde_json::Value;

/// Fields that answer each command, in priority order.
const PRIORITY_KEYS: [&str; 8] = [
    "periodic_payment",
    "net_disbursement",
    "amount_usd",
    "collection_rate",
    "cheaper_method",
    "total_payment",
    "total_due",
    "slug",
];

/// Print just the headline number from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    println!("{}", headline(result_obj));
}

fn headline(result: &Value) -> String {
    match result {
        Value::Object(map) => {
            for key in PRIORITY_KEYS {
                if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                    return format_minimal(val);
                }
            }
            match map.iter().next() {
                Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
                None => String::new(),
            }
        }
        Value::Array(arr) => arr.len().to_string(),
        _ => format_minimal(result),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
