use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency amounts as submitted. Never `f64`.
pub type Money = Decimal;

/// Percentages on a 0-100 scale (30 = 30%), never fractions.
pub type Percent = Decimal;

const PRECISION: &str = "rust_decimal_128bit";

/// Envelope returned by every scoring and dashboard entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    /// Degenerate-input and divergence notices. Never fatal.
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

impl<T: Serialize> ComputationOutput<T> {
    /// Replace the result, keeping warnings and metadata.
    pub fn map<U: Serialize>(self, f: impl FnOnce(T) -> U) -> ComputationOutput<U> {
        ComputationOutput {
            result: f(self.result),
            methodology: self.methodology,
            assumptions: self.assumptions,
            warnings: self.warnings,
            metadata: self.metadata,
        }
    }
}

/// Wrap a result in the envelope, stamping crate version and timing.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    let assumptions = serde_json::to_value(assumptions).unwrap_or_default();
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions,
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: PRECISION.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_keeps_warnings() {
        let out = with_metadata("m", &serde_json::json!({}), vec!["w".into()], 3, vec![1, 2, 3]);
        let mapped = out.map(|v| v.len());
        assert_eq!(mapped.result, 3);
        assert_eq!(mapped.warnings, vec!["w".to_string()]);
        assert_eq!(mapped.metadata.computation_time_us, 3);
    }
}
