use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::dashboard::segments;
use crate::history::HistoryRow;
use crate::scoring::engine;
use crate::types::*;
use crate::ScoreResult;

/// One history row with its ratios formatted for display (`"30.00%"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioDisplay {
    pub household_id: String,
    pub member_id: String,
    pub category: String,
    pub amount: Money,
    pub income: Money,
    pub financial_score: String,
    pub savings_to_income: String,
    pub expenses_to_income: String,
    pub loan_to_income: String,
    pub credit_card_ratio: String,
    pub spending_category_balance: String,
    pub recommendation: String,
}

pub fn format_percent(value: Percent) -> String {
    format!("{:.2}%", value.round_dp(2))
}

/// Derive the ratio table for every persisted row.
///
/// The stored score is shown as persisted. Every row of a run is checked
/// against the score re-derived under `config`; a mismatch (the
/// configuration changed, or the file was edited) adds a warning naming the
/// household.
pub fn ratio_view(
    rows: &[HistoryRow],
    config: &ScoringConfig,
) -> ScoreResult<ComputationOutput<Vec<RatioDisplay>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let mut display = Vec::with_capacity(rows.len());

    for segment in segments(rows) {
        let derived = engine::score_household(&segment.household_input()?, config)?;
        warnings.extend(derived.warnings);
        let household = derived.result;

        if let Some(stale) = segment
            .rows
            .iter()
            .find(|r| r.financial_score != household.financial_score)
        {
            warnings.push(format!(
                "Household {} (member {}): stored score {} differs from re-derived score {}.",
                segment.household_id,
                stale.member_id,
                stale.financial_score,
                household.financial_score
            ));
        }

        let s = &household.sub_scores;
        for row in segment.rows {
            display.push(RatioDisplay {
                household_id: row.household_id.clone(),
                member_id: row.member_id.clone(),
                category: row.category.clone(),
                amount: row.amount,
                income: row.income,
                financial_score: format!("{:.2}", row.financial_score.round_dp(2)),
                savings_to_income: format_percent(s.savings_to_income),
                expenses_to_income: format_percent(s.expenses_to_income),
                loan_to_income: format_percent(s.loan_to_income),
                credit_card_ratio: format_percent(s.credit_card_ratio),
                spending_category_balance: format_percent(s.spending_category_balance),
                recommendation: row.recommendation.clone(),
            });
        }
    }

    if rows.is_empty() {
        warnings.push("No history available.".to_string());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "source": "persisted history",
        "grouping": "consecutive rows of one scoring run (Run_ID, else matching content)",
        "format": "percentages rounded to 2 dp",
    });
    Ok(with_metadata(
        "Household ratio view",
        &assumptions,
        warnings,
        elapsed,
        display,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
