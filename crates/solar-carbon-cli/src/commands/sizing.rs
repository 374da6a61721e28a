use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use solar_carbon_core::config::EngineConfig;
use solar_carbon_core::energy::{calculate_energy, YieldModel};
use solar_carbon_core::shares::{portfolio_size_kwp, ShareSplit};
use solar_carbon_core::units::{normalize_size, CapacityUnit, SystemSize};

/// Arguments for size normalization
#[derive(Args)]
pub struct NormalizeArgs {
    /// System size, e.g. "250", "1.2 MWp"
    #[arg(long)]
    pub size: String,

    /// Unit for sizes without a suffix (kWp or MWp)
    #[arg(long)]
    pub unit: Option<CapacityUnit>,
}

/// Arguments for annual energy and credits
#[derive(Args)]
pub struct EnergyArgs {
    /// System size, e.g. "250", "1.2 MWp"
    #[arg(long)]
    pub size: String,

    /// Unit for sizes without a suffix (kWp or MWp)
    #[arg(long)]
    pub unit: Option<CapacityUnit>,
}

/// Arguments for the revenue share split
#[derive(Args)]
#[command(group = clap::ArgGroup::new("portfolio").required(true).multiple(false))]
pub struct SharesArgs {
    /// Portfolio size in kWp
    #[arg(long, group = "portfolio")]
    pub portfolio_kwp: Option<Decimal>,

    /// Comma-separated system sizes making up the portfolio ("500,2 MWp")
    #[arg(long, value_delimiter = ',', group = "portfolio")]
    pub systems: Option<Vec<String>>,
}

pub fn run_normalize(args: NormalizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let size = SystemSize::from(args.size.as_str());
    let kwp = normalize_size(&size, args.unit);
    Ok(json!({
        "result": {
            "input": args.size,
            "system_size_kwp": kwp,
        }
    }))
}

pub fn run_energy(
    args: EnergyArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let model = YieldModel::from(config);
    let kwp = normalize_size(&SystemSize::from(args.size.as_str()), args.unit);
    let result = calculate_energy(kwp, &model);
    Ok(json!({
        "result": result,
        "assumptions": model,
    }))
}

pub fn run_shares(args: SharesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let portfolio_kwp = match (args.portfolio_kwp, args.systems) {
        (Some(kwp), _) => {
            if kwp < Decimal::ZERO {
                return Err("--portfolio-kwp cannot be negative".into());
            }
            kwp
        }
        (None, Some(systems)) => {
            let sizes: Vec<SystemSize> = systems.into_iter().map(SystemSize::from).collect();
            portfolio_size_kwp(&sizes, None)
        }
        (None, None) => return Err("--portfolio-kwp or --systems required".into()),
    };
    let split = ShareSplit::for_portfolio(portfolio_kwp);
    Ok(json!({
        "result": {
            "portfolio_size_kwp": portfolio_kwp,
            "client_share_percentage": split.client_share_percentage,
            "agent_commission_percentage": split.agent_commission_percentage,
            "platform_percentage": split.platform_percentage,
        }
    }))
}
