pub mod dashboard;
pub mod history;
pub mod score;

use household_score_core::history::HistoryStore;
use household_score_core::ScoringConfig;
use serde_json::Value;

use crate::input;

/// Shared state resolved from the global flags.
pub struct Context {
    pub config: ScoringConfig,
    pub history: HistoryStore,
}

impl Context {
    pub fn load(config: Option<&str>, history: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config {
            Some(path) => input::file::read_config(path)?,
            None => ScoringConfig::default(),
        };
        config.validate()?;
        tracing::debug!(history, "resolved history location");
        Ok(Self {
            config,
            history: HistoryStore::new(history),
        })
    }
}

/// Print the effective configuration.
pub fn run_config(ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(&ctx.config)?)
}
