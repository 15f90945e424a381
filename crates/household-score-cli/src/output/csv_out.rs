use serde_json::Value;
use std::io;

use super::{format_scalar, primary_rows};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(rows) = primary_rows(value) {
        write_array_csv(&mut wtr, rows);
    } else if let Value::Object(map) = value {
        // Two-column CSV: field, value
        let fields = match map.get("result") {
            Some(Value::Object(result)) => result,
            _ => map,
        };
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in fields {
            let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
        }
    } else {
        let _ = wtr.write_record([&format_scalar(value)]);
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
        return;
    };

    // Nested sub-scores are flattened into their own columns.
    let mut headers: Vec<String> = Vec::new();
    for (key, val) in first {
        match val {
            Value::Object(inner) => {
                headers.extend(inner.keys().map(|k| format!("{key}.{k}")));
            }
            _ => headers.push(key.clone()),
        }
    }
    let _ = wtr.write_record(&headers);

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    let cell = match h.split_once('.') {
                        Some((outer, inner)) => map.get(outer).and_then(|o| o.get(inner)),
                        None => map.get(h.as_str()),
                    };
                    cell.map(format_scalar).unwrap_or_default()
                })
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
