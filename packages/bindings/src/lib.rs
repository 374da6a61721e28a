use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use solar_carbon_core::config::EngineConfig;
use solar_carbon_core::energy::{calculate_energy, YieldModel};
use solar_carbon_core::pricing::{
    current_and_future, Clock, PriceTable, RawPriceTable, SystemClock,
};
use solar_carbon_core::proposal::{calculate_proposal_metrics, ProposalInput};
use solar_carbon_core::revenue::RevenueProjector;
use solar_carbon_core::shares::ShareSplit;
use solar_carbon_core::units::{normalize_size, CapacityUnit, SystemSize};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse an optional engine config; absent or empty means defaults.
fn engine_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    let config = match config_json.as_deref().map(str::trim) {
        None | Some("") => EngineConfig::default(),
        Some(raw) => serde_json::from_str(raw).map_err(to_napi_error)?,
    };
    config.validate().map_err(to_napi_error)?;
    Ok(config)
}

/// Current-and-future view of a caller's price table. `as_of_year` defaults
/// to the current UTC year.
fn price_table(raw: &RawPriceTable, as_of_year: Option<i32>) -> PriceTable {
    current_and_future(raw, as_of_year.unwrap_or_else(|| SystemClock.current_year()))
}

#[derive(Deserialize)]
struct SizeInput {
    system_size: SystemSize,
    #[serde(default)]
    unit: Option<CapacityUnit>,
}

#[derive(Deserialize)]
struct PortfolioInput {
    portfolio_kwp: Decimal,
}

#[derive(Deserialize)]
struct RevenueInput {
    system_size: SystemSize,
    #[serde(default)]
    unit: Option<CapacityUnit>,
    #[serde(default)]
    commission_date: Option<NaiveDate>,
    prices: RawPriceTable,
    #[serde(default)]
    as_of_year: Option<i32>,
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

#[napi]
pub fn normalize_system_size(input_json: String) -> NapiResult<String> {
    let input: SizeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let kwp = normalize_size(&input.system_size, input.unit);
    serde_json::to_string(&json!({ "system_size_kwp": kwp })).map_err(to_napi_error)
}

#[napi]
pub fn energy_yield(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: SizeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = engine_config(config_json)?;
    let kwp = normalize_size(&input.system_size, input.unit);
    let output = calculate_energy(kwp, &YieldModel::from(&config));
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn share_split(input_json: String) -> NapiResult<String> {
    let input: PortfolioInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    serde_json::to_string(&ShareSplit::for_portfolio(input.portfolio_kwp)).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Revenue
// ---------------------------------------------------------------------------

/// Yearly revenue against a price table supplied by the caller. No fetch is
/// made; years before `as_of_year` and negative prices are dropped.
#[napi]
pub fn project_revenue(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: RevenueInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = engine_config(config_json)?;
    let projector = RevenueProjector::from_config(&config);
    let kwp = normalize_size(&input.system_size, input.unit);
    let prices = price_table(&input.prices, input.as_of_year);
    let output = json!({
        "revenue": projector.revenue(kwp, input.commission_date, &prices),
        "schedule": projector.schedule(kwp, input.commission_date, &prices),
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ProposalRequest {
    #[serde(flatten)]
    proposal: ProposalInput,
    prices: RawPriceTable,
    #[serde(default)]
    as_of_year: Option<i32>,
}

#[napi]
pub fn proposal_metrics(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: ProposalRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = engine_config(config_json)?;
    let prices = price_table(&request.prices, request.as_of_year);
    let output = calculate_proposal_metrics(&request.proposal, &prices, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
