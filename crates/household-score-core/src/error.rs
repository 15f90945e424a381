use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing field: {field} (record {record})")]
    MissingField { field: String, record: usize },

    #[error("Household {household}: field {field} differs across records (first {first}, found {found})")]
    HouseholdFieldMismatch {
        household: String,
        field: String,
        first: String,
        found: String,
    },

    #[error("Schema mismatch: missing columns {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ScoreError {
    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        ScoreError::Overflow {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for ScoreError {
    fn from(e: serde_json::Error) -> Self {
        ScoreError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for ScoreError {
    fn from(e: serde_yaml::Error) -> Self {
        ScoreError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for ScoreError {
    fn from(e: std::io::Error) -> Self {
        ScoreError::Io(e.to_string())
    }
}

#[cfg(feature = "history")]
impl From<csv::Error> for ScoreError {
    fn from(e: csv::Error) -> Self {
        ScoreError::Csv(e.to_string())
    }
}
