pub mod prices;
pub mod proposal;
pub mod revenue;
pub mod sizing;

use std::sync::Arc;

use clap::Args;
use solar_carbon_core::config::{load_config, EngineConfig, PriceSourceConfig};
use solar_carbon_core::pricing::{
    CarbonPriceSource, DynamicPriceSource, HttpPriceSource, StaticPriceSource,
};

use crate::input;

/// Load `--config`, or the defaults when it is absent.
pub fn load_engine_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(load_config(&input::file::resolve_path(path)?)?),
        None => Ok(EngineConfig::default()),
    }
}

/// Where to read carbon prices from. Falls back to `price_source` in the config.
#[derive(Args)]
pub struct PriceSourceArgs {
    /// JSON file with a {"year": price} table
    #[arg(long, conflicts_with = "price_url")]
    pub prices: Option<String>,

    /// Settings endpoint returning the price table
    #[arg(long)]
    pub price_url: Option<String>,

    /// API key for the settings endpoint (used with --price-url)
    #[arg(long, env = "CARBON_PRICE_API_KEY")]
    pub api_key: Option<String>,
}

impl PriceSourceArgs {
    fn source(
        &self,
        config: &EngineConfig,
    ) -> Result<Arc<dyn CarbonPriceSource>, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.prices {
            tracing::debug!(path = %path, "reading carbon prices from file");
            let contents = input::file::read_to_string(path)?;
            return Ok(Arc::new(StaticPriceSource::from_json(&contents)?));
        }
        let remote = match self.price_url {
            Some(ref url) => PriceSourceConfig {
                url: url.clone(),
                api_key: self.api_key.clone(),
            },
            None => config.price_source.clone().ok_or(
                "no price source: pass --prices <file.json>, --price-url <url>, \
                 or set price_source in --config",
            )?,
        };
        tracing::debug!(url = %remote.url, "fetching carbon prices from settings endpoint");
        Ok(Arc::new(HttpPriceSource::new(&remote)?))
    }

    /// Price provider using the configured cache window.
    pub fn provider(
        &self,
        config: &EngineConfig,
    ) -> Result<Arc<DynamicPriceSource>, Box<dyn std::error::Error>> {
        let source = self.source(config)?;
        Ok(Arc::new(DynamicPriceSource::from_config(source, config)))
    }
}
