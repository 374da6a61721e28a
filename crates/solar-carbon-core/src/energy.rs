//! Annual energy and carbon credit yield.
//!
//! energy (kWh)  = size_kWp x sun_hours x days
//! credits (tCO2) = energy / 1000 x emission_factor (tCO2/MWh)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::EngineConfig;
use crate::types::{Kwh, Tonnes};

/// Average peak sun hours per day.
pub const AVERAGE_SUN_HOURS: Decimal = dec!(4.5);

pub const DAYS_PER_YEAR: u32 = 365;

/// Grid emission factor, tCO2 per MWh.
pub const EMISSION_FACTOR: Decimal = dec!(1.033);

const KWH_PER_MWH: Decimal = dec!(1000);

/// Yield assumptions for a calculation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldModel {
    pub average_sun_hours: Decimal,
    pub days_per_year: u32,
    pub emission_factor: Decimal,
}

impl Default for YieldModel {
    fn default() -> Self {
        Self {
            average_sun_hours: AVERAGE_SUN_HOURS,
            days_per_year: DAYS_PER_YEAR,
            emission_factor: EMISSION_FACTOR,
        }
    }
}

impl From<&EngineConfig> for YieldModel {
    fn from(config: &EngineConfig) -> Self {
        Self {
            average_sun_hours: config.average_sun_hours,
            days_per_year: config.days_per_year,
            emission_factor: config.emission_factor,
        }
    }
}

impl YieldModel {
    /// Annual generation in kWh for a normalized size.
    ///
    /// Zero when the product leaves the Decimal range.
    pub fn annual_energy(&self, size_kwp: Decimal) -> Kwh {
        size_kwp
            .max(Decimal::ZERO)
            .checked_mul(self.average_sun_hours)
            .and_then(|e| e.checked_mul(Decimal::from(self.days_per_year)))
            .unwrap_or_else(|| {
                warn!(%size_kwp, "annual energy out of range, using zero");
                Decimal::ZERO
            })
    }

    /// Annual carbon credits in tonnes CO2 for a normalized size.
    pub fn carbon_credits(&self, size_kwp: Decimal) -> Tonnes {
        (self.annual_energy(size_kwp) / KWH_PER_MWH)
            .checked_mul(self.emission_factor)
            .unwrap_or_else(|| {
                warn!(%size_kwp, "carbon credits out of range, using zero");
                Decimal::ZERO
            })
    }
}

/// Energy and credit figures for one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyOutput {
    pub system_size_kwp: Decimal,
    pub annual_energy_kwh: Kwh,
    pub carbon_credits: Tonnes,
}

/// Annual energy with the reference assumptions.
pub fn annual_energy(size_kwp: Decimal) -> Kwh {
    YieldModel::default().annual_energy(size_kwp)
}

/// Annual carbon credits with the reference assumptions.
pub fn carbon_credits(size_kwp: Decimal) -> Tonnes {
    YieldModel::default().carbon_credits(size_kwp)
}

pub fn calculate_energy(size_kwp: Decimal, model: &YieldModel) -> EnergyOutput {
    EnergyOutput {
        system_size_kwp: size_kwp,
        annual_energy_kwh: model.annual_energy(size_kwp),
        carbon_credits: model.carbon_credits(size_kwp),
    }
}
