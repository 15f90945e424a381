//! The scoring engine: ratios, category balance, weighted aggregation and
//! recommendations, orchestrated per household by [`engine::score_batch`].

pub mod aggregate;
pub mod category;
pub mod engine;
pub mod ratios;
pub mod recommendation;
pub mod records;

pub use engine::{score_batch, score_household, BatchScore, HouseholdInput, HouseholdScore};
pub use records::{HouseholdFinances, RawRecord, ScoredRecord, TransactionRecord};
