//! Presentation-side derivations over the persisted history: the ratio
//! table, per-household summary and what-if simulation.
//!
//! Sub-scores are always re-derived through the engine, never through a
//! separate formula.

pub mod ratio_view;
pub mod simulation;
pub mod summary;

pub use ratio_view::{ratio_view, RatioDisplay};
pub use simulation::{simulate, Adjustments, SimulationResult};
pub use summary::{household_summary, HouseholdSummary};

use crate::history::HistoryRow;
use crate::scoring::category;
use crate::scoring::engine::HouseholdInput;
use crate::ScoreResult;

/// One scoring run of one household as it appears in the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<'a> {
    pub household_id: &'a str,
    pub rows: &'a [HistoryRow],
}

impl Segment<'_> {
    pub fn stored_score(&self) -> &HistoryRow {
        &self.rows[0]
    }

    /// Rebuild the engine input this segment was scored from.
    pub fn household_input(&self) -> ScoreResult<HouseholdInput> {
        Ok(HouseholdInput {
            household_id: self.household_id.to_string(),
            finances: self.rows[0].finances(),
            category_totals: category::category_totals(
                self.rows.iter().map(|r| (r.category.as_str(), r.amount)),
            )?,
        })
    }
}

/// Whether two adjacent rows were written by the same scoring run.
///
/// Rows carrying a run id are grouped by it. Rows without one (files
/// written elsewhere) fall back to content: same household, same
/// household-level fields and the same stored result. Two identical runs
/// written back to back without ids are indistinguishable and merge.
fn same_run(a: &HistoryRow, b: &HistoryRow) -> bool {
    if a.household_id != b.household_id {
        return false;
    }
    match (a.run_id, b.run_id) {
        (Some(x), Some(y)) => x == y,
        (None, None) => {
            a.finances() == b.finances()
                && a.financial_score == b.financial_score
                && a.recommendation == b.recommendation
        }
        _ => false,
    }
}

/// Split the history into scoring runs, in file order.
pub fn segments(rows: &[HistoryRow]) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=rows.len() {
        let boundary = i == rows.len() || !same_run(&rows[start], &rows[i]);
        if boundary {
            out.push(Segment {
                household_id: rows[start].household_id.as_str(),
                rows: &rows[start..i],
            });
            start = i;
        }
    }
    out
}
