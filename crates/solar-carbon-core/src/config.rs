//! Engine configuration.
//!
//! Every field has a default matching the production deployment, so an empty
//! JSON object (`{}`) is a valid configuration file.

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::energy::{AVERAGE_SUN_HOURS, DAYS_PER_YEAR, EMISSION_FACTOR};
use crate::error::CarbonError;
use crate::CarbonResult;

fn default_emission_factor() -> Decimal {
    EMISSION_FACTOR
}

fn default_sun_hours() -> Decimal {
    AVERAGE_SUN_HOURS
}

fn default_days_per_year() -> u32 {
    DAYS_PER_YEAR
}

fn default_300() -> u64 {
    300
}

fn default_2030() -> i32 {
    2030
}

fn default_2025() -> i32 {
    2025
}

/// Where the carbon price table comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSourceConfig {
    /// Settings endpoint returning the year -> price table.
    pub url: String,
    /// API key sent as `apikey` and bearer token (hosted settings stores expect both).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Grid emission factor in tCO2 per MWh.
    #[serde(default = "default_emission_factor")]
    pub emission_factor: Decimal,

    /// Average peak sun hours per day.
    #[serde(default = "default_sun_hours")]
    pub average_sun_hours: Decimal,

    /// Days used when annualising energy production.
    #[serde(default = "default_days_per_year")]
    pub days_per_year: u32,

    /// Validity window of the cached price table (seconds).
    #[serde(default = "default_300")]
    pub cache_ttl_secs: u64,

    /// The dense yearly schedule always runs at least through this year.
    #[serde(default = "default_2030")]
    pub horizon_end_year: i32,

    /// Commissioning dates before Jan 1 of this year are floored to it.
    #[serde(default = "default_2025")]
    pub projection_floor_year: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_source: Option<PriceSourceConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            emission_factor: EMISSION_FACTOR,
            average_sun_hours: AVERAGE_SUN_HOURS,
            days_per_year: DAYS_PER_YEAR,
            cache_ttl_secs: 300,
            horizon_end_year: 2030,
            projection_floor_year: 2025,
            price_source: None,
        }
    }
}

impl EngineConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn validate(&self) -> CarbonResult<()> {
        if self.emission_factor < Decimal::ZERO {
            return Err(CarbonError::Config(
                "emission_factor cannot be negative".into(),
            ));
        }
        if self.average_sun_hours < Decimal::ZERO {
            return Err(CarbonError::Config(
                "average_sun_hours cannot be negative".into(),
            ));
        }
        if self.days_per_year == 0 || self.days_per_year > 366 {
            return Err(CarbonError::Config(format!(
                "days_per_year must be between 1 and 366, got {}",
                self.days_per_year
            )));
        }
        if self.cache_ttl_secs == 0 {
            return Err(CarbonError::Config(
                "cache_ttl_secs must be greater than zero".into(),
            ));
        }
        if self.horizon_end_year < self.projection_floor_year {
            return Err(CarbonError::Config(format!(
                "horizon_end_year ({}) precedes projection_floor_year ({})",
                self.horizon_end_year, self.projection_floor_year
            )));
        }
        if let Some(ref source) = self.price_source {
            if source.url.trim().is_empty() {
                return Err(CarbonError::Config("price_source.url is empty".into()));
            }
        }
        Ok(())
    }
}

/// Load and validate a JSON configuration file.
pub fn load_config(path: &Path) -> CarbonResult<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&content).map_err(|e| {
        CarbonError::Config(format!("Failed to parse '{}': {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}
