use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use solar_carbon_core::config::EngineConfig;
use solar_carbon_core::revenue::projection::total;
use solar_carbon_core::revenue::{parse_commission_date, RevenueCalculator};
use solar_carbon_core::shares::{Party, ShareSplit};
use solar_carbon_core::units::{normalize_size, CapacityUnit, SystemSize};

use super::PriceSourceArgs;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RevenueSplit {
    /// Gross carbon revenue
    Total,
    Client,
    Agent,
    Platform,
}

impl RevenueSplit {
    fn party(self) -> Option<Party> {
        match self {
            Self::Total => None,
            Self::Client => Some(Party::Client),
            Self::Agent => Some(Party::Agent),
            Self::Platform => Some(Party::Platform),
        }
    }
}

/// Arguments shared by revenue and schedule
#[derive(Args)]
pub struct SystemArgs {
    /// System size, e.g. "250", "1.2 MWp"
    #[arg(long)]
    pub size: String,

    /// Unit for sizes without a suffix (kWp or MWp)
    #[arg(long)]
    pub unit: Option<CapacityUnit>,

    /// Commissioning date (YYYY-MM-DD); the first year is pro-rated by day
    #[arg(long, value_parser = parse_date)]
    pub commission_date: Option<NaiveDate>,
}

/// Arguments for the revenue projection
#[derive(Args)]
pub struct RevenueArgs {
    #[command(flatten)]
    pub system: SystemArgs,

    #[command(flatten)]
    pub source: PriceSourceArgs,

    /// Whose share to project
    #[arg(long, value_enum, default_value = "total")]
    pub split: RevenueSplit,

    /// Portfolio size in kWp for tier lookup (defaults to this system)
    #[arg(long)]
    pub portfolio_kwp: Option<Decimal>,
}

/// Arguments for the dense yearly schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub system: SystemArgs,

    #[command(flatten)]
    pub source: PriceSourceArgs,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_commission_date(s).map_err(|e| e.to_string())
}

pub async fn run_revenue(
    args: RevenueArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let calc = RevenueCalculator::from_config(args.source.provider(config)?, config);
    let size = SystemSize::from(args.system.size.as_str());
    let unit = args.system.unit;
    let date = args.system.commission_date;
    let size_kwp = normalize_size(&size, unit);

    let (revenue, percentage) = match args.split.party() {
        None => (calc.revenue(&size, date, unit).await, None),
        Some(party) => {
            let portfolio = args.portfolio_kwp.unwrap_or(size_kwp);
            let pct = ShareSplit::for_portfolio(portfolio).percentage(party);
            (
                calc.commission_revenue(&size, date, unit, pct).await,
                Some(pct),
            )
        }
    };

    let mut warnings = Vec::new();
    if revenue.is_empty() {
        warnings.push("No priced years in the projection; check the price source".to_string());
    }
    if let Some(effective) = calc.projector().effective_commission_date(date) {
        if Some(effective) != date {
            warnings.push(format!("Commissioning date floored to {effective}"));
        }
    }

    Ok(json!({
        "result": {
            "system_size_kwp": size_kwp,
            "split": format!("{:?}", args.split).to_lowercase(),
            "percentage": percentage,
            "revenue": revenue,
            "total": total(&revenue),
        },
        "warnings": warnings,
    }))
}

pub async fn run_schedule(
    args: ScheduleArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let calc = RevenueCalculator::from_config(args.source.provider(config)?, config);
    let size = SystemSize::from(args.system.size.as_str());
    let rows = calc
        .schedule(&size, args.system.commission_date, args.system.unit)
        .await;
    Ok(json!({ "results": rows }))
}
