use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::scoring::aggregate::SubScores;
use crate::types::{Money, Percent};
use crate::{ScoreError, ScoreResult};

/// Category assigned when a record does not name one.
pub const DEFAULT_CATEGORY: &str = "Other";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One submitted transaction exactly as received.
///
/// Every field is optional so that absence can be reported per field and per
/// record instead of as an opaque parse failure. Accepts both snake_case keys
/// and the spreadsheet column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "Family_ID", alias = "family_id")]
    pub household_id: Option<String>,
    #[serde(default, alias = "Member_ID")]
    pub member_id: Option<String>,
    #[serde(default, alias = "Category")]
    pub category: Option<String>,
    #[serde(default, alias = "Amount")]
    pub amount: Option<Money>,
    #[serde(default, alias = "Income")]
    pub income: Option<Money>,
    #[serde(default, alias = "Monthly_Expenses")]
    pub monthly_expenses: Option<Money>,
    #[serde(default, alias = "Loan_Payments")]
    pub loan_payments: Option<Money>,
    #[serde(default, alias = "Credit_Card_Spending")]
    pub credit_card_spending: Option<Money>,
    #[serde(default, alias = "Savings")]
    pub savings: Option<Money>,
}

/// The five household-level fields shared by every record of a household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdFinances {
    pub income: Money,
    pub monthly_expenses: Money,
    pub loan_payments: Money,
    pub credit_card_spending: Money,
    pub savings: Money,
}

impl HouseholdFinances {
    /// Field name / value pairs, in the order divergence is reported.
    pub fn fields(&self) -> [(&'static str, Money); 5] {
        [
            ("income", self.income),
            ("monthly_expenses", self.monthly_expenses),
            ("loan_payments", self.loan_payments),
            ("credit_card_spending", self.credit_card_spending),
            ("savings", self.savings),
        ]
    }
}

/// A validated transaction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub household_id: String,
    pub member_id: String,
    pub category: String,
    pub amount: Money,
    pub finances: HouseholdFinances,
}

impl RawRecord {
    /// Validate and convert. `index` is the record's position in the batch
    /// and is only used for error reporting.
    pub fn into_transaction(self, index: usize) -> ScoreResult<TransactionRecord> {
        let household_id = required_text(self.household_id, "household_id", index)?;
        let member_id = required_text(self.member_id, "member_id", index)?;
        let amount = required(self.amount, "amount", index)?;
        let income = required(self.income, "income", index)?;
        let monthly_expenses = required(self.monthly_expenses, "monthly_expenses", index)?;
        let loan_payments = required(self.loan_payments, "loan_payments", index)?;
        let credit_card_spending =
            required(self.credit_card_spending, "credit_card_spending", index)?;
        let savings = required(self.savings, "savings", index)?;

        if income < Decimal::ZERO {
            return Err(ScoreError::InvalidInput {
                field: "income".into(),
                reason: format!("Income must not be negative (record {index})."),
            });
        }

        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        Ok(TransactionRecord {
            household_id,
            member_id,
            category,
            amount,
            finances: HouseholdFinances {
                income,
                monthly_expenses,
                loan_payments,
                credit_card_spending,
                savings,
            },
        })
    }
}

fn required<T>(value: Option<T>, field: &str, record: usize) -> ScoreResult<T> {
    value.ok_or_else(|| ScoreError::MissingField {
        field: field.to_string(),
        record,
    })
}

fn required_text(value: Option<String>, field: &str, record: usize) -> ScoreResult<String> {
    let text = required(value, field, record)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ScoreError::MissingField {
            field: field.to_string(),
            record,
        });
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One output row per input record, carrying the household's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub household_id: String,
    pub member_id: String,
    pub category: String,
    pub amount: Money,
    pub income: Money,
    pub monthly_expenses: Money,
    pub loan_payments: Money,
    pub credit_card_spending: Money,
    pub savings: Money,
    pub financial_score: Percent,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_scores: Option<SubScores>,
}

impl ScoredRecord {
    pub fn finances(&self) -> HouseholdFinances {
        HouseholdFinances {
            income: self.income,
            monthly_expenses: self.monthly_expenses,
            loan_payments: self.loan_payments,
            credit_card_spending: self.credit_card_spending,
            savings: self.savings,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
