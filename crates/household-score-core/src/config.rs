//! Scoring configuration.
//!
//! Every weight, tier cut-off and advice threshold used by the engine lives
//! here and is passed by reference into the aggregator and the
//! recommendation generator. `ScoringConfig::default()` is the canonical
//! table; override files only need to name the values they change.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::scoring::aggregate::checked_sum;
use crate::types::Percent;
use crate::{ScoreError, ScoreResult};

// ---------------------------------------------------------------------------
// Canonical constants
// ---------------------------------------------------------------------------

const W_SAVINGS: Decimal = dec!(0.30);
const W_EXPENSES: Decimal = dec!(0.25);
const W_LOANS: Decimal = dec!(0.20);
const W_CREDIT_CARD: Decimal = dec!(0.15);
const W_CATEGORY_BALANCE: Decimal = dec!(0.10);

const TIER_EXCELLENT: Percent = dec!(80);
const TIER_GOOD: Percent = dec!(60);
const TIER_AVERAGE: Percent = dec!(40);

const MIN_SAVINGS_TO_INCOME: Percent = dec!(20);
const MAX_EXPENSES_TO_INCOME: Percent = dec!(60);
const MAX_LOAN_TO_INCOME: Percent = dec!(30);
const MAX_CREDIT_CARD_RATIO: Percent = dec!(40);
const MIN_CATEGORY_BALANCE: Percent = dec!(70);

const DISCRETIONARY: [&str; 3] = ["Entertainment", "Travel", "Food"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Weights applied to the five sub-scores. Must sum to exactly 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub savings_to_income: Decimal,
    pub expenses_to_income: Decimal,
    pub loan_to_income: Decimal,
    pub credit_card: Decimal,
    pub spending_category_balance: Decimal,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            savings_to_income: W_SAVINGS,
            expenses_to_income: W_EXPENSES,
            loan_to_income: W_LOANS,
            credit_card: W_CREDIT_CARD,
            spending_category_balance: W_CATEGORY_BALANCE,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> ScoreResult<Decimal> {
        checked_sum(self.named().map(|(_, w)| w), "weights")
    }

    fn named(&self) -> [(&'static str, Decimal); 5] {
        [
            ("weights.savings_to_income", self.savings_to_income),
            ("weights.expenses_to_income", self.expenses_to_income),
            ("weights.loan_to_income", self.loan_to_income),
            ("weights.credit_card", self.credit_card),
            (
                "weights.spending_category_balance",
                self.spending_category_balance,
            ),
        ]
    }
}

/// Lower bounds (inclusive) of each tier. Anything below `average` is Poor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub excellent: Percent,
    pub good: Percent,
    pub average: Percent,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            excellent: TIER_EXCELLENT,
            good: TIER_GOOD,
            average: TIER_AVERAGE,
        }
    }
}

/// Sub-score limits that trigger an advice message when breached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceThresholds {
    /// Savings-to-income below this triggers "increase savings".
    pub min_savings_to_income: Percent,
    /// Raw expenses-to-income above this triggers "reduce expenses".
    pub max_expenses_to_income: Percent,
    /// Raw loan-to-income above this triggers "lower loan payments".
    pub max_loan_to_income: Percent,
    /// Raw credit-card ratio above this triggers "cut credit card spending".
    pub max_credit_card_ratio: Percent,
    /// Category balance below this triggers "balance discretionary spending".
    pub min_category_balance: Percent,
}

impl Default for AdviceThresholds {
    fn default() -> Self {
        Self {
            min_savings_to_income: MIN_SAVINGS_TO_INCOME,
            max_expenses_to_income: MAX_EXPENSES_TO_INCOME,
            max_loan_to_income: MAX_LOAN_TO_INCOME,
            max_credit_card_ratio: MAX_CREDIT_CARD_RATIO,
            min_category_balance: MIN_CATEGORY_BALANCE,
        }
    }
}

/// What to do when records of one household disagree on a household-level
/// field (income, expenses, loans, credit card, savings).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergencePolicy {
    /// Fail the whole run.
    #[default]
    Reject,
    /// Keep the first record's values and record a warning.
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub tiers: TierThresholds,
    pub advice: AdviceThresholds,
    pub discretionary_categories: Vec<String>,
    pub divergence_policy: DivergencePolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            tiers: TierThresholds::default(),
            advice: AdviceThresholds::default(),
            discretionary_categories: DISCRETIONARY.iter().map(|c| c.to_string()).collect(),
            divergence_policy: DivergencePolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl ScoringConfig {
    /// Parse a JSON override document. Missing keys keep their defaults.
    pub fn from_json_str(s: &str) -> ScoreResult<Self> {
        let config: ScoringConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML override document. Missing keys keep their defaults.
    pub fn from_yaml_str(s: &str) -> ScoreResult<Self> {
        let config: ScoringConfig = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ScoreResult<()> {
        for (field, weight) in self.weights.named() {
            if weight < Decimal::ZERO {
                return Err(ScoreError::InvalidInput {
                    field: field.into(),
                    reason: "Weights must be non-negative.".into(),
                });
            }
        }
        let total = self.weights.total()?;
        if total != Decimal::ONE {
            return Err(ScoreError::InvalidInput {
                field: "weights".into(),
                reason: format!("Weights must sum to 1, got {total}."),
            });
        }
        let t = &self.tiers;
        if !(t.excellent > t.good && t.good > t.average) {
            return Err(ScoreError::InvalidInput {
                field: "tiers".into(),
                reason: "Tier cut-offs must be strictly descending (excellent > good > average)."
                    .into(),
            });
        }
        Ok(())
    }

    /// Whether `category` counts as discretionary spending.
    ///
    /// Matching ignores surrounding whitespace and ASCII case.
    pub fn is_discretionary(&self, category: &str) -> bool {
        let category = category.trim();
        self.discretionary_categories
            .iter()
            .any(|d| d.trim().eq_ignore_ascii_case(category))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
