use clap::Args;
use serde_json::{json, Value};

use solar_carbon_core::config::EngineConfig;

use super::PriceSourceArgs;

/// Arguments for listing carbon prices
#[derive(Args)]
pub struct PricesArgs {
    #[command(flatten)]
    pub source: PriceSourceArgs,

    /// Fail instead of printing an empty table when the fetch fails
    #[arg(long)]
    pub strict: bool,
}

pub async fn run_prices(
    args: PricesArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let provider = args.source.provider(config)?;
    let table = if args.strict {
        provider.try_prices().await?
    } else {
        provider.prices().await
    };

    let mut warnings = Vec::new();
    if table.is_empty() {
        warnings.push(format!(
            "No carbon prices for {} or later; revenue will be empty",
            provider.current_year()
        ));
    }
    Ok(json!({
        "result": table,
        "warnings": warnings,
    }))
}
