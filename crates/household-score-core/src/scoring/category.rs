//! Spending-category balance.
//!
//! Penalises households whose spending is concentrated in discretionary
//! categories. `balance = max(0, (1 - discretionary / total) * 100)`; a total
//! of zero or less gives a penalty ratio of 0 and therefore a balance of 100.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::scoring::aggregate::checked_sum;
use crate::types::{Money, Percent};
use crate::{ScoreError, ScoreResult};

/// Summed transaction amount per category label.
pub type CategoryTotals = BTreeMap<String, Money>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBalance {
    pub discretionary_total: Money,
    pub total: Money,
    pub penalty_ratio: Decimal,
    pub balance: Percent,
    /// True when there was no positive spending to measure.
    pub degenerate: bool,
}

/// Sum amounts by category label.
pub fn category_totals<'a, I>(transactions: I) -> ScoreResult<CategoryTotals>
where
    I: IntoIterator<Item = (&'a str, Money)>,
{
    let mut totals = CategoryTotals::new();
    for (category, amount) in transactions {
        let total = totals.entry(category.to_string()).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(amount)
            .ok_or_else(|| ScoreError::overflow(format!("category total for {category}")))?;
    }
    Ok(totals)
}

pub fn spending_category_balance(
    totals: &CategoryTotals,
    config: &ScoringConfig,
) -> ScoreResult<CategoryBalance> {
    let total = checked_sum(totals.values().copied(), "category spending total")?;
    let discretionary_total = checked_sum(
        totals
            .iter()
            .filter(|(category, _)| config.is_discretionary(category))
            .map(|(_, amount)| *amount),
        "discretionary spending total",
    )?;

    let degenerate = total <= Decimal::ZERO;
    let penalty_ratio = if degenerate {
        Decimal::ZERO
    } else {
        discretionary_total
            .checked_div(total)
            .ok_or_else(|| ScoreError::overflow("category penalty ratio"))?
    };
    let balance = Decimal::ONE
        .checked_sub(penalty_ratio)
        .and_then(|share| share.checked_mul(dec!(100)))
        .ok_or_else(|| ScoreError::overflow("spending category balance"))?;

    Ok(CategoryBalance {
        discretionary_total,
        total,
        penalty_ratio,
        balance: balance.max(Decimal::ZERO),
        degenerate,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(entries: &[(&str, Decimal)]) -> CategoryTotals {
        category_totals(entries.iter().map(|(c, a)| (*c, *a))).unwrap()
    }

    #[test]
    fn test_totals_sum_per_label() {
        let t = totals(&[("Food", dec!(100)), ("Other", dec!(50)), ("Food", dec!(25))]);
        assert_eq!(t.len(), 2);
        assert_eq!(t["Food"], dec!(125));
        assert_eq!(t["Other"], dec!(50));
    }

    #[test]
    fn test_all_other_is_fully_balanced() {
        let b = spending_category_balance(&totals(&[("Other", dec!(4_000))]), &ScoringConfig::default()).unwrap();
        assert_eq!(b.penalty_ratio, Decimal::ZERO);
        assert_eq!(b.balance, dec!(100));
        assert!(!b.degenerate);
    }

    #[test]
    fn test_no_transactions_is_degenerate_and_balanced() {
        let b = spending_category_balance(&CategoryTotals::new(), &ScoringConfig::default()).unwrap();
        assert!(b.degenerate);
        assert_eq!(b.total, Decimal::ZERO);
        assert_eq!(b.balance, dec!(100));
    }

    #[test]
    fn test_mixed_spending() {
        // 300 discretionary of 1000 total -> 70
        let b = spending_category_balance(
            &totals(&[
                ("Entertainment", dec!(100)),
                ("Travel", dec!(150)),
                ("Food", dec!(50)),
                ("Rent", dec!(700)),
            ]),
            &ScoringConfig::default(),
        )
        .unwrap();
        assert_eq!(b.discretionary_total, dec!(300));
        assert_eq!(b.penalty_ratio, dec!(0.3));
        assert_eq!(b.balance, dec!(70));
    }

    #[test]
    fn test_all_discretionary_scores_zero() {
        let b = spending_category_balance(
            &totals(&[("Travel", dec!(800)), ("Food", dec!(200))]),
            &ScoringConfig::default(),
        )
        .unwrap();
        assert_eq!(b.balance, Decimal::ZERO);
    }

    #[test]
    fn test_custom_discretionary_set() {
        let mut config = ScoringConfig::default();
        config.discretionary_categories = vec!["Gadgets".into()];
        let b = spending_category_balance(
            &totals(&[("Gadgets", dec!(250)), ("Food", dec!(750))]),
            &config,
        )
        .unwrap();
        assert_eq!(b.balance, dec!(75));
    }

    #[test]
    fn test_total_overflow_is_reported() {
        let near_max = Decimal::MAX - dec!(1);
        let err = category_totals([("Food", near_max), ("Food", near_max)]).unwrap_err();
        assert!(matches!(err, ScoreError::Overflow { .. }));

        let split = totals(&[("Food", near_max), ("Other", near_max)]);
        assert!(spending_category_balance(&split, &ScoringConfig::default()).is_err());
    }
}
