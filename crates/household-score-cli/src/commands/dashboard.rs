use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use household_score_core::dashboard::{self, Adjustments};

use super::Context;

/// Arguments for the what-if simulator
#[derive(Args)]
pub struct SimulateArgs {
    /// Household to simulate
    #[arg(long)]
    pub family_id: String,

    /// Increase savings by this percentage (0-100)
    #[arg(long, default_value = "0")]
    pub increase_savings: Decimal,

    /// Reduce monthly expenses by this percentage (0-100)
    #[arg(long, default_value = "0")]
    pub reduce_expenses: Decimal,

    /// Reduce credit card spending by this percentage (0-100)
    #[arg(long, default_value = "0")]
    pub reduce_credit_card: Decimal,
}

pub fn run_view(ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let rows = ctx.history.load()?;
    let result = dashboard::ratio_view(&rows, &ctx.config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_summary(ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let rows = ctx.history.load()?;
    Ok(serde_json::to_value(dashboard::household_summary(&rows))?)
}

pub fn run_simulate(args: SimulateArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let rows = ctx.history.load()?;
    let adjustments = Adjustments {
        increase_savings_pct: args.increase_savings,
        reduce_expenses_pct: args.reduce_expenses,
        reduce_credit_card_pct: args.reduce_credit_card,
    };
    let result = dashboard::simulate(&rows, &args.family_id, &adjustments, &ctx.config)?;
    Ok(serde_json::to_value(result)?)
}
