use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{format_scalar, primary_rows};

/// Columns shown for the per-household block of a scored batch.
const HOUSEHOLD_COLUMNS: [&str; 6] = [
    "household_id",
    "members",
    "transactions",
    "financial_score",
    "tier",
    "recommendation",
];

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some(rows) = primary_rows(value) {
        print_array_table(rows, None);
        if let Some(Value::Array(households)) = value
            .get("result")
            .and_then(|r| r.get("households"))
        {
            println!("\nHouseholds:");
            print_array_table(households, Some(&HOUSEHOLD_COLUMNS));
        }
    } else if let Some(result) = value.get("result") {
        print_flat_object(result);
    } else {
        print_flat_object(value);
    }

    if let Value::Object(envelope) = value {
        print_envelope_notes(envelope);
    }
}

fn print_envelope_notes(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    match value {
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in map {
                builder.push_record([key.as_str(), &format_value(val)]);
            }
            println!("{}", Table::from(builder));
        }
        other => println!("{}", format_value(other)),
    }
}

fn print_array_table(arr: &[Value], columns: Option<&[&str]>) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = match columns {
        Some(cols) => cols.iter().map(|c| c.to_string()).collect(),
        None => first.keys().cloned().collect(),
    };
    let mut builder = Builder::default();
    builder.push_record(&headers);

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }

    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, format_scalar(v)))
            .collect::<Vec<_>>()
            .join(" "),
        other => format_scalar(other),
    }
}
