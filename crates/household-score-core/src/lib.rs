pub mod config;
pub mod error;
pub mod scoring;
pub mod types;

#[cfg(feature = "history")]
pub mod history;

#[cfg(feature = "dashboard")]
pub mod dashboard;

pub use config::ScoringConfig;
pub use error::ScoreError;
pub use types::*;

/// Standard result type for all household-score operations
pub type ScoreResult<T> = Result<T, ScoreError>;
