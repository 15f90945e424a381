use serde::{Deserialize, Serialize};

use crate::config::{AdviceThresholds, ScoringConfig, TierThresholds};
use crate::scoring::aggregate::SubScores;
use crate::types::Percent;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Excellent,
    Good,
    Average,
    Poor,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent"),
            Self::Good => write!(f, "Good"),
            Self::Average => write!(f, "Average"),
            Self::Poor => write!(f, "Poor"),
        }
    }
}

/// A threshold-triggered piece of advice, in the order it is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advice {
    IncreaseSavings,
    ReduceExpenses,
    LowerLoanPayments,
    CutCreditCardSpending,
    BalanceDiscretionarySpending,
}

impl Advice {
    pub fn message(&self, thresholds: &AdviceThresholds) -> String {
        match self {
            Self::IncreaseSavings => format!(
                "Increase savings to at least {}% of income.",
                thresholds.min_savings_to_income.normalize()
            ),
            Self::ReduceExpenses => format!(
                "Reduce expenses to below {}% of income.",
                thresholds.max_expenses_to_income.normalize()
            ),
            Self::LowerLoanPayments => format!(
                "Lower loan payments to less than {}% of income.",
                thresholds.max_loan_to_income.normalize()
            ),
            Self::CutCreditCardSpending => "Cut down on credit card spending.".to_string(),
            Self::BalanceDiscretionarySpending => {
                "Balance discretionary spending better.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub tier: Tier,
    pub advice: Vec<Advice>,
    pub messages: Vec<String>,
    /// `"<Tier>: <messages joined by spaces>"`, with the trailing separator
    /// kept even when no advice applies.
    pub text: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn classify_tier(score: Percent, tiers: &TierThresholds) -> Tier {
    if score >= tiers.excellent {
        Tier::Excellent
    } else if score >= tiers.good {
        Tier::Good
    } else if score >= tiers.average {
        Tier::Average
    } else {
        Tier::Poor
    }
}

/// Advice whose threshold is breached, independent of the tier.
pub fn triggered_advice(scores: &SubScores, thresholds: &AdviceThresholds) -> Vec<Advice> {
    let checks = [
        (
            scores.savings_to_income < thresholds.min_savings_to_income,
            Advice::IncreaseSavings,
        ),
        (
            scores.expenses_to_income > thresholds.max_expenses_to_income,
            Advice::ReduceExpenses,
        ),
        (
            scores.loan_to_income > thresholds.max_loan_to_income,
            Advice::LowerLoanPayments,
        ),
        (
            scores.credit_card_ratio > thresholds.max_credit_card_ratio,
            Advice::CutCreditCardSpending,
        ),
        (
            scores.spending_category_balance < thresholds.min_category_balance,
            Advice::BalanceDiscretionarySpending,
        ),
    ];

    checks
        .into_iter()
        .filter_map(|(breached, advice)| breached.then_some(advice))
        .collect()
}

pub fn format_recommendation(tier: Tier, messages: &[String]) -> String {
    format!("{}: {}", tier, messages.join(" "))
}

pub fn recommend(final_score: Percent, scores: &SubScores, config: &ScoringConfig) -> Recommendation {
    let tier = classify_tier(final_score, &config.tiers);
    let advice = triggered_advice(scores, &config.advice);
    let messages: Vec<String> = advice.iter().map(|a| a.message(&config.advice)).collect();
    let text = format_recommendation(tier, &messages);

    Recommendation {
        tier,
        advice,
        messages,
        text,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn healthy() -> SubScores {
        SubScores {
            savings_to_income: dec!(30),
            expenses_to_income: dec!(40),
            expenses_score: dec!(60),
            loan_to_income: dec!(10),
            loan_score: dec!(90),
            credit_card_ratio: dec!(5),
            credit_card_score: dec!(95),
            spending_category_balance: dec!(100),
        }
    }

    #[test]
    fn test_tier_boundaries_inclusive() {
        let tiers = TierThresholds::default();
        assert_eq!(classify_tier(dec!(80), &tiers), Tier::Excellent);
        assert_eq!(classify_tier(dec!(79.99), &tiers), Tier::Good);
        assert_eq!(classify_tier(dec!(60), &tiers), Tier::Good);
        assert_eq!(classify_tier(dec!(40), &tiers), Tier::Average);
        assert_eq!(classify_tier(dec!(39.99), &tiers), Tier::Poor);
        assert_eq!(classify_tier(Decimal::ZERO, &tiers), Tier::Poor);
    }

    #[test]
    fn test_no_advice_keeps_trailing_separator() {
        let rec = recommend(dec!(66.25), &healthy(), &ScoringConfig::default());
        assert_eq!(rec.tier, Tier::Good);
        assert!(rec.advice.is_empty());
        assert_eq!(rec.text, "Good: ");
    }

    #[test]
    fn test_every_threshold_breached() {
        let scores = SubScores {
            savings_to_income: dec!(5),
            expenses_to_income: dec!(75),
            expenses_score: dec!(25),
            loan_to_income: dec!(35),
            loan_score: dec!(65),
            credit_card_ratio: dec!(45),
            credit_card_score: dec!(55),
            spending_category_balance: dec!(50),
        };
        let rec = recommend(dec!(30), &scores, &ScoringConfig::default());
        assert_eq!(rec.tier, Tier::Poor);
        assert_eq!(
            rec.advice,
            vec![
                Advice::IncreaseSavings,
                Advice::ReduceExpenses,
                Advice::LowerLoanPayments,
                Advice::CutCreditCardSpending,
                Advice::BalanceDiscretionarySpending,
            ]
        );
        assert_eq!(
            rec.text,
            "Poor: Increase savings to at least 20% of income. \
             Reduce expenses to below 60% of income. \
             Lower loan payments to less than 30% of income. \
             Cut down on credit card spending. \
             Balance discretionary spending better."
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        // Values sitting exactly on a threshold do not trigger advice.
        let scores = SubScores {
            savings_to_income: dec!(20),
            expenses_to_income: dec!(60),
            expenses_score: dec!(40),
            loan_to_income: dec!(30),
            loan_score: dec!(70),
            credit_card_ratio: dec!(40),
            credit_card_score: dec!(60),
            spending_category_balance: dec!(70),
        };
        assert!(triggered_advice(&scores, &AdviceThresholds::default()).is_empty());
    }

    #[test]
    fn test_advice_uses_raw_credit_ratio() {
        let mut scores = healthy();
        scores.credit_card_ratio = dec!(41);
        scores.credit_card_score = dec!(59);
        assert_eq!(
            triggered_advice(&scores, &AdviceThresholds::default()),
            vec![Advice::CutCreditCardSpending]
        );
    }

    #[test]
    fn test_message_follows_configured_threshold() {
        let mut config = ScoringConfig::default();
        config.advice.min_savings_to_income = dec!(40);
        let rec = recommend(dec!(66.25), &healthy(), &config);
        assert_eq!(rec.text, "Good: Increase savings to at least 40% of income.");
    }
}
