use serde::{Deserialize, Serialize};

use crate::dashboard::segments;
use crate::history::HistoryRow;
use crate::types::Percent;

/// Latest stored score of one household, the data behind the
/// scores-by-household chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdSummary {
    pub household_id: String,
    pub latest_score: Percent,
    pub latest_recommendation: String,
    /// Transactions in the latest scoring run.
    pub latest_transactions: usize,
    pub scoring_runs: usize,
    pub total_rows: usize,
}

/// One entry per household, in order of first appearance in the history.
pub fn household_summary(rows: &[HistoryRow]) -> Vec<HouseholdSummary> {
    let mut out: Vec<HouseholdSummary> = Vec::new();
    for segment in segments(rows) {
        let stored = segment.stored_score();
        match out.iter_mut().find(|s| s.household_id == segment.household_id) {
            Some(summary) => {
                summary.latest_score = stored.financial_score;
                summary.latest_recommendation = stored.recommendation.clone();
                summary.latest_transactions = segment.rows.len();
                summary.scoring_runs += 1;
                summary.total_rows += segment.rows.len();
            }
            None => out.push(HouseholdSummary {
                household_id: segment.household_id.to_string(),
                latest_score: stored.financial_score,
                latest_recommendation: stored.recommendation.clone(),
                latest_transactions: segment.rows.len(),
                scoring_runs: 1,
                total_rows: segment.rows.len(),
            }),
        }
    }
    out
}
