use household_score_core::scoring::RawRecord;
use serde_json::Value;
use std::io::{self, Read};

/// Read piped stdin, or None when stdin is a TTY or empty.
fn read_piped() -> Result<Option<String>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}

/// Read a batch of records from piped stdin.
///
/// JSON (a single object or an array of objects) when the payload starts
/// with `{` or `[`, CSV with a header row otherwise.
pub fn read_stdin_records() -> Result<Option<Vec<RawRecord>>, Box<dyn std::error::Error>> {
    let Some(payload) = read_piped()? else {
        return Ok(None);
    };

    if payload.starts_with('{') || payload.starts_with('[') {
        let value: Value = serde_json::from_str(&payload)?;
        return Ok(Some(records_from_value(value)?));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(payload.as_bytes());
    let records = rdr.deserialize().collect::<Result<Vec<RawRecord>, _>>()?;
    Ok(Some(records))
}

/// Accept either a single record object or an array of records.
pub fn records_from_value(value: Value) -> Result<Vec<RawRecord>, Box<dyn std::error::Error>> {
    let records = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        Value::Object(_) => vec![serde_json::from_value(value)?],
        other => return Err(format!("Expected a record or array of records, got {other}").into()),
    };
    Ok(records)
}
