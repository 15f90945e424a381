use serde_json::Value;

use super::format_scalar;

/// Print just the key answer from the output.
///
/// Batches print one `household score recommendation` line per household;
/// single results print the first well-known score field found.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Array(households)) = result_obj.get("households") {
        for h in households {
            println!(
                "{}\t{}\t{}",
                h.get("household_id").map(format_scalar).unwrap_or_default(),
                h.get("financial_score").map(format_scalar).unwrap_or_default(),
                h.get("recommendation").map(format_scalar).unwrap_or_default(),
            );
        }
        return;
    }

    // Priority list of key output fields
    let priority_keys = [
        "new_score",
        "financial_score",
        "latest_score",
        "recommendation",
        "message",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    if let Value::Array(items) = result_obj {
        for item in items {
            let id = item.get("household_id").map(format_scalar).unwrap_or_default();
            let score = item
                .get("latest_score")
                .or_else(|| item.get("financial_score"))
                .map(format_scalar)
                .unwrap_or_default();
            println!("{}\t{}", id, score);
        }
        return;
    }

    println!("{}", format_scalar(result_obj));
}
