use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::ScoreWeights;
use crate::scoring::ratios::IncomeRatios;
use crate::types::Percent;
use crate::{ScoreError, ScoreResult};

const SCORE_MIN: Percent = Decimal::ZERO;
const SCORE_MAX: Percent = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The sub-scores of one household, with the raw ratios they come from.
///
/// `expenses_to_income`, `loan_to_income` and `credit_card_ratio` are the raw
/// shares of income used for display and advice; `expenses_score`,
/// `loan_score` and `credit_card_score` are their inverted forms that feed the
/// weighted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub savings_to_income: Percent,
    pub expenses_to_income: Percent,
    pub expenses_score: Percent,
    pub loan_to_income: Percent,
    pub loan_score: Percent,
    pub credit_card_ratio: Percent,
    pub credit_card_score: Percent,
    pub spending_category_balance: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedComponent {
    pub name: String,
    pub sub_score: Percent,
    pub weight: Decimal,
    pub weighted_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
    pub components: Vec<WeightedComponent>,
    /// Weighted sum before clamping.
    pub raw_score: Decimal,
    /// `raw_score` clamped to [0, 100].
    pub final_score: Percent,
    pub clamped: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn sub_scores(ratios: &IncomeRatios, category_balance: Percent) -> ScoreResult<SubScores> {
    let inverted = |share: Percent, context: &str| {
        SCORE_MAX
            .checked_sub(share)
            .map(|score| score.normalize())
            .ok_or_else(|| ScoreError::overflow(context))
    };
    Ok(SubScores {
        savings_to_income: ratios.savings_to_income.normalize(),
        expenses_to_income: ratios.expenses_to_income.normalize(),
        expenses_score: inverted(ratios.expenses_to_income, "expenses_score")?,
        loan_to_income: ratios.loan_to_income.normalize(),
        loan_score: inverted(ratios.loan_to_income, "loan_score")?,
        credit_card_ratio: ratios.credit_card_ratio.normalize(),
        credit_card_score: ratios.credit_card_score.normalize(),
        spending_category_balance: category_balance.normalize(),
    })
}

/// Weighted sum of the five scoring components, clamped to [0, 100].
pub fn aggregate(scores: &SubScores, weights: &ScoreWeights) -> ScoreResult<AggregateScore> {
    let components = vec![
        build_component(
            "Savings-to-Income",
            scores.savings_to_income,
            weights.savings_to_income,
        )?,
        build_component(
            "Expenses-to-Income (inverted)",
            scores.expenses_score,
            weights.expenses_to_income,
        )?,
        build_component(
            "Loan-to-Income (inverted)",
            scores.loan_score,
            weights.loan_to_income,
        )?,
        build_component(
            "Credit Card (inverted)",
            scores.credit_card_score,
            weights.credit_card,
        )?,
        build_component(
            "Spending Category Balance",
            scores.spending_category_balance,
            weights.spending_category_balance,
        )?,
    ];

    let raw_score = checked_sum(components.iter().map(|c| c.weighted_value), "weighted score")?;
    let final_score = clamp_score(raw_score);

    Ok(AggregateScore {
        clamped: final_score != raw_score,
        raw_score: raw_score.normalize(),
        final_score: final_score.normalize(),
        components,
    })
}

pub fn clamp_score(score: Decimal) -> Percent {
    score.max(SCORE_MIN).min(SCORE_MAX)
}

/// Sum that reports overflow instead of panicking.
pub(crate) fn checked_sum<I>(values: I, context: &str) -> ScoreResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .ok_or_else(|| ScoreError::overflow(context))
}

fn build_component(name: &str, sub_score: Percent, weight: Decimal) -> ScoreResult<WeightedComponent> {
    let weighted_value = sub_score
        .checked_mul(weight)
        .ok_or_else(|| ScoreError::overflow(format!("{name} component")))?;
    Ok(WeightedComponent {
        name: name.to_string(),
        sub_score,
        weight,
        weighted_value,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
