use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use household_score_core::dashboard::{self, Adjustments};
use household_score_core::history::HistoryRow;
use household_score_core::scoring::{self, HouseholdInput, RawRecord};
use household_score_core::ScoringConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse an optional JSON configuration, falling back to the defaults.
fn config_from(config_json: Option<String>) -> NapiResult<ScoringConfig> {
    match config_json {
        Some(json) => ScoringConfig::from_json_str(&json).map_err(to_napi_error),
        None => Ok(ScoringConfig::default()),
    }
}

#[derive(Deserialize)]
struct SimulateRequest {
    rows: Vec<HistoryRow>,
    household_id: String,
    #[serde(default)]
    adjustments: Adjustments,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[napi]
pub fn score_batch(records_json: String, config_json: Option<String>) -> NapiResult<String> {
    let records: Vec<RawRecord> = serde_json::from_str(&records_json).map_err(to_napi_error)?;
    let config = config_from(config_json)?;
    let output = scoring::score_batch(&records, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn score_household(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: HouseholdInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = config_from(config_json)?;
    let output = scoring::score_household(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[napi]
pub fn ratio_view(rows_json: String, config_json: Option<String>) -> NapiResult<String> {
    let rows: Vec<HistoryRow> = serde_json::from_str(&rows_json).map_err(to_napi_error)?;
    let config = config_from(config_json)?;
    let output = dashboard::ratio_view(&rows, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn simulate(request_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: SimulateRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let config = config_from(config_json)?;
    let output = dashboard::simulate(
        &request.rows,
        &request.household_id,
        &request.adjustments,
        &config,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[napi]
pub fn default_config() -> NapiResult<String> {
    serde_json::to_string(&ScoringConfig::default()).map_err(to_napi_error)
}
