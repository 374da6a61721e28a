use clap::Args;
use serde_json::Value;

use solar_carbon_core::config::EngineConfig;
use solar_carbon_core::proposal::{project_proposal, ProposalInput};

use super::PriceSourceArgs;
use crate::input;

/// Arguments for proposal metrics
#[derive(Args)]
pub struct ProposalArgs {
    /// Path to a JSON proposal (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub source: PriceSourceArgs,
}

pub async fn run_proposal(
    args: ProposalArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let proposal: ProposalInput = input::read_input(args.input.as_deref())?;
    let provider = args.source.provider(config)?;
    let result = project_proposal(&proposal, &provider, config).await?;
    Ok(serde_json::to_value(result)?)
}
