use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    // Ranking output: one line per standing, cheapest first
    if let Some(Value::Array(standings)) = value.as_object().and_then(|m| m.get("standings")) {
        for entry in standings {
            let model = entry.get("model").and_then(Value::as_str).unwrap_or("?");
            let combined = entry
                .get("costs")
                .and_then(|c| c.get("combined_cost_per_month"))
                .map(format_minimal)
                .unwrap_or_default();
            println!("{}: {}", model, combined);
        }
        return;
    }

    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = [
        "combined_cost_per_month",
        "leasing_cost_per_month",
        "fuel_cost_per_month",
        "benefit_in_kind_per_month",
        "Super E5",
    ];

    if let Value::Object(map) = result_obj {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", format_minimal(result_obj));
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
