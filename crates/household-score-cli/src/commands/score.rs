use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use household_score_core::scoring::{self, RawRecord};

use super::Context;
use crate::input;

/// Arguments for batch scoring
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to a JSON or CSV batch (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Include per-record sub-scores
    #[arg(long)]
    pub details: bool,

    /// Append the scored records to the history spreadsheet
    #[arg(long)]
    pub persist: bool,
}

/// Arguments for the single-record entry form
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AddArgs {
    /// Household identifier
    #[arg(long)]
    pub family_id: String,

    /// Member identifier
    #[arg(long)]
    pub member_id: String,

    /// Spending category
    #[arg(long, default_value = "Other")]
    pub category: String,

    /// Transaction amount
    #[arg(long)]
    pub amount: Decimal,

    /// Household monthly income
    #[arg(long)]
    pub income: Decimal,

    /// Household monthly expenses
    #[arg(long)]
    pub monthly_expenses: Decimal,

    /// Household loan payments
    #[arg(long)]
    pub loan_payments: Decimal,

    /// Household credit card spending
    #[arg(long)]
    pub credit_card_spending: Decimal,

    /// Household savings
    #[arg(long)]
    pub savings: Decimal,
}

pub fn run_score(args: ScoreArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let records: Vec<RawRecord> = if let Some(ref path) = args.input {
        let p = std::path::Path::new(path);
        if input::file::has_extension(p, &["csv"]) {
            input::file::read_csv(path)?
        } else {
            input::stdin::records_from_value(input::file::read_json(path)?)?
        }
    } else if let Some(records) = input::stdin::read_stdin_records()? {
        records
    } else {
        return Err("--input file is required (or pipe records on stdin)".into());
    };

    let output = scoring::score_batch(&records, &ctx.config)?;

    let persisted = if args.persist {
        Some(ctx.history.append(&output.result.records)?)
    } else {
        None
    };

    let details = args.details;
    let output = output.map(|mut batch| {
        if !details {
            for record in &mut batch.records {
                record.sub_scores = None;
            }
        }
        batch
    });

    let mut value = serde_json::to_value(output)?;
    if let (Some(rows), Value::Object(map)) = (persisted, &mut value) {
        map.insert(
            "persisted".into(),
            json!({ "rows": rows, "path": ctx.history.path().display().to_string() }),
        );
    }
    Ok(value)
}

/// Score one submitted record and append it to the history.
pub fn run_add(args: AddArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let record = RawRecord {
        household_id: Some(args.family_id),
        member_id: Some(args.member_id),
        category: Some(args.category),
        amount: Some(args.amount),
        income: Some(args.income),
        monthly_expenses: Some(args.monthly_expenses),
        loan_payments: Some(args.loan_payments),
        credit_card_spending: Some(args.credit_card_spending),
        savings: Some(args.savings),
    };

    let output = scoring::score_batch(std::slice::from_ref(&record), &ctx.config)?;
    ctx.history.append(&output.result.records)?;

    let scored = output
        .result
        .records
        .first()
        .ok_or("scoring produced no record")?;
    Ok(json!({
        "message": "Data added successfully!",
        "result": {
            "household_id": scored.household_id,
            "member_id": scored.member_id,
            "financial_score": scored.financial_score,
            "recommendation": scored.recommendation,
        },
        "warnings": output.warnings,
    }))
}
