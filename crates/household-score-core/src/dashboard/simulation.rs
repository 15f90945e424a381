//! What-if simulation against a household's latest stored scoring run.

use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::dashboard::segments;
use crate::history::HistoryRow;
use crate::scoring::aggregate::SubScores;
use crate::scoring::engine::{self, HouseholdInput};
use crate::scoring::recommendation::Tier;
use crate::scoring::records::HouseholdFinances;
use crate::types::*;
use crate::{ScoreError, ScoreResult};

/// Percentage changes to apply, each in [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub increase_savings_pct: Percent,
    pub reduce_expenses_pct: Percent,
    pub reduce_credit_card_pct: Percent,
}

impl Adjustments {
    fn validate(&self) -> ScoreResult<()> {
        for (field, value) in [
            ("increase_savings_pct", self.increase_savings_pct),
            ("reduce_expenses_pct", self.reduce_expenses_pct),
            ("reduce_credit_card_pct", self.reduce_credit_card_pct),
        ] {
            if value < Decimal::ZERO || value > dec!(100) {
                return Err(ScoreError::InvalidInput {
                    field: field.into(),
                    reason: format!("Adjustment must be between 0 and 100, got {value}."),
                });
            }
        }
        Ok(())
    }

    pub fn apply(&self, finances: &HouseholdFinances) -> ScoreResult<HouseholdFinances> {
        let shift = |value: Money, pct: Percent, grow: bool, field: &str| -> ScoreResult<Money> {
            let delta = value
                .checked_mul(pct / dec!(100))
                .ok_or_else(|| ScoreError::overflow(field))?;
            let shifted = if grow {
                value.checked_add(delta)
            } else {
                value.checked_sub(delta)
            };
            shifted.ok_or_else(|| ScoreError::overflow(field))
        };
        Ok(HouseholdFinances {
            savings: shift(finances.savings, self.increase_savings_pct, true, "savings")?,
            monthly_expenses: shift(
                finances.monthly_expenses,
                self.reduce_expenses_pct,
                false,
                "monthly_expenses",
            )?,
            credit_card_spending: shift(
                finances.credit_card_spending,
                self.reduce_credit_card_pct,
                false,
                "credit_card_spending",
            )?,
            ..*finances
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub household_id: String,
    pub adjustments: Adjustments,
    pub current_finances: HouseholdFinances,
    pub simulated_finances: HouseholdFinances,
    /// Score as persisted for the latest run.
    pub current_score: Percent,
    pub new_score: Percent,
    pub improvement: Decimal,
    pub sub_scores: SubScores,
    pub tier: Tier,
    pub recommendation: String,
}

/// Rescore `household_id`'s latest stored run with `adjustments` applied.
///
/// The recommendation is generated from the simulated sub-scores.
pub fn simulate(
    rows: &[HistoryRow],
    household_id: &str,
    adjustments: &Adjustments,
    config: &ScoringConfig,
) -> ScoreResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    adjustments.validate()?;

    let segment = segments(rows)
        .into_iter()
        .rev()
        .find(|s| s.household_id == household_id)
        .ok_or_else(|| ScoreError::NotFound(format!("household {household_id}")))?;

    let base = segment.household_input()?;
    let current_finances = base.finances;
    let simulated_finances = adjustments.apply(&current_finances)?;

    let rescored = engine::score_household(
        &HouseholdInput {
            finances: simulated_finances,
            ..base
        },
        config,
    )?;
    let household = rescored.result;
    let current_score = segment.stored_score().financial_score;

    tracing::debug!(
        household = household_id,
        current = %current_score,
        simulated = %household.financial_score,
        "simulated household"
    );

    let output = SimulationResult {
        household_id: household_id.to_string(),
        adjustments: adjustments.clone(),
        current_finances,
        simulated_finances,
        current_score,
        new_score: household.financial_score,
        improvement: (household.financial_score - current_score).normalize(),
        sub_scores: household.sub_scores,
        tier: household.tier,
        recommendation: household.recommendation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "savings": "savings * (1 + increase_savings_pct / 100)",
        "expenses": "expenses * (1 - reduce_expenses_pct / 100)",
        "credit_card": "credit_card * (1 - reduce_credit_card_pct / 100)",
        "baseline": "latest stored scoring run of the household",
    });
    Ok(with_metadata(
        "Household what-if simulation",
        &assumptions,
        rescored.warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::fixtures::row;

    #[test]
    fn test_no_adjustment_reproduces_stored_score() {
        let rows = vec![row("F1", "M1", "Other", dec!(4_000))];
        let out = simulate(&rows, "F1", &Adjustments::default(), &ScoringConfig::default())
            .unwrap();
        assert_eq!(out.result.new_score, dec!(66.25));
        assert_eq!(out.result.improvement, Decimal::ZERO);
        assert_eq!(out.result.recommendation, "Good: ");
    }

    #[test]
    fn test_adjustments_improve_score() {
        let rows = vec![row("F1", "M1", "Other", dec!(4_000))];
        let adjustments = Adjustments {
            increase_savings_pct: dec!(50),
            reduce_expenses_pct: dec!(25),
            reduce_credit_card_pct: dec!(100),
        };
        let out = simulate(&rows, "F1", &adjustments, &ScoringConfig::default()).unwrap();
        let r = &out.result;
        assert_eq!(r.simulated_finances.savings, dec!(4_500));
        assert_eq!(r.simulated_finances.monthly_expenses, dec!(3_000));
        assert_eq!(r.simulated_finances.credit_card_spending, Decimal::ZERO);
        assert_eq!(r.simulated_finances.income, dec!(10_000));
        // 45*.3 + 70*.25 + 90*.2 + 100*.15 + 100*.1 = 13.5 + 17.5 + 18 + 15 + 10
        assert_eq!(r.new_score, dec!(74));
        assert_eq!(r.improvement, dec!(7.75));
        assert_eq!(r.tier, Tier::Good);
    }

    #[test]
    fn test_uses_latest_run() {
        let mut rerun = row("F1", "M1", "Other", dec!(4_000));
        rerun.savings = dec!(1_000);
        // 10*.3 + 15 + 18 + 14.25 + 10
        rerun.financial_score = dec!(60.25);
        let rows = vec![row("F1", "M1", "Other", dec!(4_000)), rerun];
        let out = simulate(&rows, "F1", &Adjustments::default(), &ScoringConfig::default())
            .unwrap();
        assert_eq!(out.result.current_score, dec!(60.25));
        assert_eq!(out.result.new_score, dec!(60.25));
        assert_eq!(
            out.result.recommendation,
            "Good: Increase savings to at least 20% of income."
        );
    }

    #[test]
    fn test_separate_runs_with_same_finances() {
        // Two single-row runs: Food scored 56.25, then Other scored 66.25.
        let mut food = row("F1", "M1", "Food", dec!(100));
        food.financial_score = dec!(56.25);
        food.run_id = Some(1);
        let mut other = row("F1", "M1", "Other", dec!(100));
        other.run_id = Some(2);
        let out = simulate(&[food, other], "F1", &Adjustments::default(), &ScoringConfig::default())
            .unwrap();
        assert_eq!(out.result.current_score, dec!(66.25));
        assert_eq!(out.result.new_score, dec!(66.25));
        assert_eq!(out.result.improvement, Decimal::ZERO);
    }

    #[test]
    fn test_unknown_household() {
        let rows = vec![row("F1", "M1", "Other", dec!(4_000))];
        let err = simulate(&rows, "F9", &Adjustments::default(), &ScoringConfig::default())
            .unwrap_err();
        assert!(matches!(err, ScoreError::NotFound(_)));
    }

    #[test]
    fn test_out_of_range_adjustment() {
        let rows = vec![row("F1", "M1", "Other", dec!(4_000))];
        let adjustments = Adjustments {
            reduce_expenses_pct: dec!(120),
            ..Adjustments::default()
        };
        match simulate(&rows, "F1", &adjustments, &ScoringConfig::default()).unwrap_err() {
            ScoreError::InvalidInput { field, .. } => assert_eq!(field, "reduce_expenses_pct"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }
}
