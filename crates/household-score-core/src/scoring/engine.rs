use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::{DivergencePolicy, ScoringConfig};
use crate::scoring::aggregate::{self, SubScores, WeightedComponent};
use crate::scoring::category::{self, CategoryTotals};
use crate::scoring::ratios;
use crate::scoring::recommendation::{self, Advice, Tier};
use crate::scoring::records::{HouseholdFinances, RawRecord, ScoredRecord, TransactionRecord};
use crate::types::*;
use crate::{ScoreError, ScoreResult};

const METHODOLOGY: &str = "Weighted household financial health score";

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Already-aggregated data for one household.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdInput {
    pub household_id: String,
    pub finances: HouseholdFinances,
    #[serde(default)]
    pub category_totals: CategoryTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdScore {
    pub household_id: String,
    pub members: usize,
    pub transactions: usize,
    pub finances: HouseholdFinances,
    pub category_totals: CategoryTotals,
    pub sub_scores: SubScores,
    pub components: Vec<WeightedComponent>,
    pub financial_score: Percent,
    pub tier: Tier,
    pub advice: Vec<Advice>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchScore {
    /// One record per input record, grouped by household in order of first
    /// appearance; members keep their input order within a household.
    pub records: Vec<ScoredRecord>,
    pub households: Vec<HouseholdScore>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Score a batch of submitted transaction records.
///
/// The run is all-or-nothing: a missing field, invalid value or (under the
/// `Reject` policy) divergent household field fails the whole batch before
/// any output is produced.
pub fn score_batch(
    records: &[RawRecord],
    config: &ScoringConfig,
) -> ScoreResult<ComputationOutput<BatchScore>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // -- Validation ----------------------------------------------------------
    config.validate()?;
    let transactions = records
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, raw)| raw.into_transaction(index))
        .collect::<ScoreResult<Vec<_>>>()?;

    if transactions.is_empty() {
        warnings.push("Empty batch: no records to score.".to_string());
    }

    // -- Per-household scoring -----------------------------------------------
    let mut output_records = Vec::with_capacity(transactions.len());
    let mut households = Vec::new();

    for (household_id, members) in group_by_household(&transactions) {
        let finances = consistent_finances(household_id, &members, config, &mut warnings)?;
        let totals = category::category_totals(
            members.iter().map(|t| (t.category.as_str(), t.amount)),
        )?;

        let mut score = score_group(household_id, &finances, totals, config, &mut warnings)?;
        score.transactions = members.len();
        score.members = members
            .iter()
            .map(|t| t.member_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        tracing::debug!(
            household = household_id,
            transactions = score.transactions,
            score = %score.financial_score,
            tier = %score.tier,
            "scored household"
        );

        for tx in &members {
            output_records.push(ScoredRecord {
                household_id: tx.household_id.clone(),
                member_id: tx.member_id.clone(),
                category: tx.category.clone(),
                amount: tx.amount,
                income: finances.income,
                monthly_expenses: finances.monthly_expenses,
                loan_payments: finances.loan_payments,
                credit_card_spending: finances.credit_card_spending,
                savings: finances.savings,
                financial_score: score.financial_score,
                recommendation: score.recommendation.clone(),
                sub_scores: Some(score.sub_scores.clone()),
            });
        }
        households.push(score);
    }

    let output = BatchScore {
        records: output_records,
        households,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        METHODOLOGY,
        &assumptions(config),
        warnings,
        elapsed,
        output,
    ))
}

/// Score one household from pre-aggregated finances and category totals.
pub fn score_household(
    input: &HouseholdInput,
    config: &ScoringConfig,
) -> ScoreResult<ComputationOutput<HouseholdScore>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    config.validate()?;
    if input.household_id.trim().is_empty() {
        return Err(ScoreError::MissingField {
            field: "household_id".into(),
            record: 0,
        });
    }
    if input.finances.income.is_sign_negative() {
        return Err(ScoreError::InvalidInput {
            field: "income".into(),
            reason: "Income must not be negative.".into(),
        });
    }

    let score = score_group(
        &input.household_id,
        &input.finances,
        input.category_totals.clone(),
        config,
        &mut warnings,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        METHODOLOGY,
        &assumptions(config),
        warnings,
        elapsed,
        score,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn score_group(
    household_id: &str,
    finances: &HouseholdFinances,
    category_totals: CategoryTotals,
    config: &ScoringConfig,
    warnings: &mut Vec<String>,
) -> ScoreResult<HouseholdScore> {
    let income_ratios = ratios::income_ratios(finances)?;
    if income_ratios.degenerate_income {
        degenerate(
            warnings,
            format!("Household {household_id}: income is zero; income ratios saturate."),
        );
    }

    let balance = category::spending_category_balance(&category_totals, config)?;
    if balance.degenerate {
        degenerate(
            warnings,
            format!(
                "Household {household_id}: no positive category spending; \
                 category balance defaults to 100."
            ),
        );
    }

    let sub_scores = aggregate::sub_scores(&income_ratios, balance.balance)?;
    let aggregate = aggregate::aggregate(&sub_scores, &config.weights)?;
    if aggregate.clamped {
        warnings.push(format!(
            "Household {household_id}: weighted score {} clamped to {}.",
            aggregate.raw_score, aggregate.final_score
        ));
    }

    let rec = recommendation::recommend(aggregate.final_score, &sub_scores, config);

    Ok(HouseholdScore {
        household_id: household_id.to_string(),
        members: 0,
        transactions: 0,
        finances: *finances,
        category_totals,
        sub_scores,
        components: aggregate.components,
        financial_score: aggregate.final_score,
        tier: rec.tier,
        advice: rec.advice,
        recommendation: rec.text,
    })
}

fn degenerate(warnings: &mut Vec<String>, message: String) {
    tracing::warn!("{message}");
    warnings.push(message);
}

/// Group transactions by household id, in order of first appearance.
fn group_by_household(transactions: &[TransactionRecord]) -> Vec<(&str, Vec<&TransactionRecord>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&TransactionRecord>)> = Vec::new();
    for tx in transactions {
        let id = tx.household_id.as_str();
        match index.get(id) {
            Some(&i) => groups[i].1.push(tx),
            None => {
                index.insert(id, groups.len());
                groups.push((id, vec![tx]));
            }
        }
    }
    groups
}

/// Check that every record of a household carries the same household-level
/// fields. Returns the first record's values.
fn consistent_finances(
    household_id: &str,
    members: &[&TransactionRecord],
    config: &ScoringConfig,
    warnings: &mut Vec<String>,
) -> ScoreResult<HouseholdFinances> {
    let first = members[0].finances;
    let mut reported: BTreeSet<&'static str> = BTreeSet::new();

    for tx in &members[1..] {
        for ((field, expected), (_, found)) in first.fields().into_iter().zip(tx.finances.fields()) {
            if expected == found || reported.contains(field) {
                continue;
            }
            match config.divergence_policy {
                DivergencePolicy::Reject => {
                    return Err(ScoreError::HouseholdFieldMismatch {
                        household: household_id.to_string(),
                        field: field.to_string(),
                        first: expected.to_string(),
                        found: found.to_string(),
                    });
                }
                DivergencePolicy::Warn => {
                    reported.insert(field);
                    let message = format!(
                        "Household {household_id}: {field} differs across records \
                         ({expected} vs {found}); using first record's value."
                    );
                    tracing::warn!("{message}");
                    warnings.push(message);
                }
            }
        }
    }
    Ok(first)
}

fn assumptions(config: &ScoringConfig) -> serde_json::Value {
    serde_json::json!({
        "formula": "score = 0.30*S/I + 0.25*(100-E/I) + 0.20*(100-L/I) + 0.15*max(0,100-CC/I) + 0.10*balance",
        "weights": config.weights,
        "tiers": config.tiers,
        "advice_thresholds": config.advice,
        "discretionary_categories": config.discretionary_categories,
        "divergence_policy": config.divergence_policy,
        "capping": "savings, expenses and loan ratios capped at 100%; final score clamped to [0, 100]",
        "zero_income": "ratios saturate to 0% (zero numerator) or 100%",
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn raw(household: &str, member: &str, category: &str, amount: Decimal) -> RawRecord {
        RawRecord {
            household_id: Some(household.into()),
            member_id: Some(member.into()),
            category: Some(category.into()),
            amount: Some(amount),
            income: Some(dec!(10_000)),
            monthly_expenses: Some(dec!(4_000)),
            loan_payments: Some(dec!(1_000)),
            credit_card_spending: Some(dec!(500)),
            savings: Some(dec!(3_000)),
        }
    }

    #[test]
    fn test_reference_household() {
        let out = score_batch(&[raw("F1", "M1", "Other", dec!(4_000))], &ScoringConfig::default())
            .unwrap();
        let batch = &out.result;
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].financial_score, dec!(66.25));
        assert_eq!(batch.records[0].recommendation, "Good: ");
        assert_eq!(batch.households[0].tier, Tier::Good);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_score_broadcast_to_every_member() {
        let records = vec![
            raw("F1", "M1", "Food", dec!(600)),
            raw("F1", "M2", "Other", dec!(400)),
            raw("F1", "M1", "Travel", dec!(200)),
        ];
        let out = score_batch(&records, &ScoringConfig::default()).unwrap();
        let batch = &out.result;
        assert_eq!(batch.records.len(), 3);
        assert_eq!(batch.households.len(), 1);
        assert_eq!(batch.households[0].members, 2);
        assert_eq!(batch.households[0].transactions, 3);
        let first = &batch.records[0];
        assert!(batch
            .records
            .iter()
            .all(|r| r.financial_score == first.financial_score
                && r.recommendation == first.recommendation));
    }

    #[test]
    fn test_output_grouped_by_first_appearance() {
        let records = vec![
            raw("F2", "A", "Other", dec!(10)),
            raw("F1", "B", "Other", dec!(10)),
            raw("F2", "C", "Other", dec!(10)),
        ];
        let out = score_batch(&records, &ScoringConfig::default()).unwrap();
        let order: Vec<(&str, &str)> = out
            .result
            .records
            .iter()
            .map(|r| (r.household_id.as_str(), r.member_id.as_str()))
            .collect();
        assert_eq!(order, vec![("F2", "A"), ("F2", "C"), ("F1", "B")]);
    }

    #[test]
    fn test_divergent_household_rejected_by_default() {
        let mut second = raw("F1", "M2", "Other", dec!(10));
        second.income = Some(dec!(12_000));
        let err = score_batch(
            &[raw("F1", "M1", "Other", dec!(10)), second],
            &ScoringConfig::default(),
        )
        .unwrap_err();
        match err {
            ScoreError::HouseholdFieldMismatch { household, field, .. } => {
                assert_eq!(household, "F1");
                assert_eq!(field, "income");
            }
            other => panic!("Expected HouseholdFieldMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_divergent_household_warns_under_warn_policy() {
        let mut config = ScoringConfig::default();
        config.divergence_policy = DivergencePolicy::Warn;
        let mut second = raw("F1", "M2", "Other", dec!(10));
        second.savings = Some(dec!(1));
        let mut third = raw("F1", "M3", "Other", dec!(10));
        third.savings = Some(dec!(2));

        let out = score_batch(&[raw("F1", "M1", "Other", dec!(10)), second, third], &config)
            .unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("savings"));
        assert!(out.result.records.iter().all(|r| r.savings == dec!(3_000)));
    }

    #[test]
    fn test_missing_field_aborts_whole_batch() {
        let mut broken = raw("F2", "M1", "Other", dec!(10));
        broken.monthly_expenses = None;
        let err = score_batch(
            &[raw("F1", "M1", "Other", dec!(10)), broken],
            &ScoringConfig::default(),
        )
        .unwrap_err();
        match err {
            ScoreError::MissingField { field, record } => {
                assert_eq!(field, "monthly_expenses");
                assert_eq!(record, 1);
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_income_is_explicit_warning() {
        let mut r = raw("F1", "M1", "Other", dec!(10));
        r.income = Some(Decimal::ZERO);
        let out = score_batch(&[r], &ScoringConfig::default()).unwrap();
        let h = &out.result.households[0];
        assert_eq!(h.sub_scores.savings_to_income, dec!(100));
        assert_eq!(h.sub_scores.expenses_score, Decimal::ZERO);
        assert_eq!(h.sub_scores.loan_score, Decimal::ZERO);
        assert_eq!(h.sub_scores.credit_card_score, Decimal::ZERO);
        // 100*.3 + 0 + 0 + 0 + 100*.1
        assert_eq!(h.financial_score, dec!(40));
        assert!(out.warnings.iter().any(|w| w.contains("income is zero")));
    }

    #[test]
    fn test_empty_batch() {
        let out = score_batch(&[], &ScoringConfig::default()).unwrap();
        assert!(out.result.records.is_empty());
        assert!(out.result.households.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected_before_scoring() {
        let mut config = ScoringConfig::default();
        config.weights.savings_to_income = dec!(0.9);
        assert!(score_batch(&[raw("F1", "M1", "Other", dec!(1))], &config).is_err());
    }

    #[test]
    fn test_score_household_matches_batch() {
        let config = ScoringConfig::default();
        let batch = score_batch(
            &[
                raw("F1", "M1", "Food", dec!(300)),
                raw("F1", "M2", "Other", dec!(700)),
            ],
            &config,
        )
        .unwrap();
        let from_batch = &batch.result.households[0];

        let input = HouseholdInput {
            household_id: "F1".into(),
            finances: from_batch.finances,
            category_totals: from_batch.category_totals.clone(),
        };
        let single = score_household(&input, &config).unwrap().result;
        assert_eq!(single.financial_score, from_batch.financial_score);
        assert_eq!(single.sub_scores, from_batch.sub_scores);
        assert_eq!(single.recommendation, from_batch.recommendation);
    }

    #[test]
    fn test_metadata_populated() {
        let out = score_batch(&[raw("F1", "M1", "Other", dec!(1))], &ScoringConfig::default())
            .unwrap();
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
        assert!(out.methodology.contains("household"));
        assert!(out.assumptions.get("weights").is_some());
    }
}
