//! Income ratios.
//!
//! Three capped ratios (savings, expenses, loans) are limited to 100% at the
//! top but carry no lower bound. The credit-card ratio exists in two forms:
//! the raw display ratio (`max(0, cc / income * 100)`) and the inverted score
//! contribution (`max(0, (1 - cc / income) * 100)`).
//!
//! A zero income is handled explicitly: the ratio saturates to 0% when the
//! numerator is zero and to ±100% otherwise.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::scoring::records::HouseholdFinances;
use crate::types::{Money, Percent};
use crate::{ScoreError, ScoreResult};

const HUNDRED: Decimal = dec!(100);

/// Every income-based ratio for one household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRatios {
    pub savings_to_income: Percent,
    pub expenses_to_income: Percent,
    pub loan_to_income: Percent,
    /// Raw credit-card share of income, for display and advice.
    pub credit_card_ratio: Percent,
    /// Inverted credit-card share, used in the weighted score.
    pub credit_card_score: Percent,
    /// True when income was zero and the ratios saturated.
    pub degenerate_income: bool,
}

/// `numerator / denominator` as a percentage, uncapped.
pub fn ratio(numerator: Money, denominator: Money) -> ScoreResult<Percent> {
    checked_ratio(numerator, denominator, "ratio")
}

fn checked_ratio(numerator: Money, denominator: Money, context: &str) -> ScoreResult<Percent> {
    if denominator.is_zero() {
        return Ok(saturated(numerator));
    }
    numerator
        .checked_div(denominator)
        .and_then(|share| share.checked_mul(HUNDRED))
        .ok_or_else(|| ScoreError::overflow(context))
}

fn saturated(numerator: Money) -> Percent {
    if numerator.is_zero() {
        Decimal::ZERO
    } else if numerator.is_sign_negative() {
        -HUNDRED
    } else {
        HUNDRED
    }
}

fn capped(numerator: Money, denominator: Money, context: &str) -> ScoreResult<Percent> {
    Ok(checked_ratio(numerator, denominator, context)?.min(HUNDRED))
}

pub fn savings_to_income(savings: Money, income: Money) -> ScoreResult<Percent> {
    capped(savings, income, "savings_to_income")
}

pub fn expenses_to_income(expenses: Money, income: Money) -> ScoreResult<Percent> {
    capped(expenses, income, "expenses_to_income")
}

pub fn loan_to_income(loans: Money, income: Money) -> ScoreResult<Percent> {
    capped(loans, income, "loan_to_income")
}

/// Inverted credit-card share: higher is better.
pub fn credit_card_score(credit_card: Money, income: Money) -> ScoreResult<Percent> {
    let share = checked_ratio(credit_card, income, "credit_card_score")?;
    HUNDRED
        .checked_sub(share)
        .map(|score| score.max(Decimal::ZERO))
        .ok_or_else(|| ScoreError::overflow("credit_card_score"))
}

/// Raw credit-card share of income, floored at zero.
pub fn credit_card_ratio(credit_card: Money, income: Money) -> ScoreResult<Percent> {
    Ok(checked_ratio(credit_card, income, "credit_card_ratio")?.max(Decimal::ZERO))
}

pub fn income_ratios(finances: &HouseholdFinances) -> ScoreResult<IncomeRatios> {
    let income = finances.income;
    Ok(IncomeRatios {
        savings_to_income: savings_to_income(finances.savings, income)?,
        expenses_to_income: expenses_to_income(finances.monthly_expenses, income)?,
        loan_to_income: loan_to_income(finances.loan_payments, income)?,
        credit_card_ratio: credit_card_ratio(finances.credit_card_spending, income)?,
        credit_card_score: credit_card_score(finances.credit_card_spending, income)?,
        degenerate_income: income.is_zero(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
