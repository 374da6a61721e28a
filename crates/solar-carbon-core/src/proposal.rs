//! Proposal metrics: the scalars written back onto a proposal record when a
//! proposal is created or viewed.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::CarbonError;
use crate::pricing::{DynamicPriceSource, PriceTable};
use crate::revenue::RevenueProjector;
use crate::revenue::YearlyRevenueSplit;
use crate::shares::{portfolio_size_kwp, ShareSplit};
use crate::types::{saturating_sum, with_metadata, ComputationOutput, Kwh, Money, Percent, Tonnes};
use crate::units::{normalize_size, CapacityUnit, SystemSize};
use crate::CarbonResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalInput {
    /// Size of the proposed system ("250", "1.2 MWp", 250).
    pub system_size: SystemSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<CapacityUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_date: Option<NaiveDate>,
    /// The client's other systems; they count towards the share tiers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub existing_systems: Vec<SystemSize>,
    /// Explicit portfolio size in kWp, overriding the computed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_kwp: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalMetrics {
    pub system_size_kwp: Decimal,
    pub portfolio_size_kwp: Decimal,
    pub annual_energy: Kwh,
    pub carbon_credits: Tonnes,
    pub client_share_percentage: Percent,
    pub agent_commission_percentage: Percent,
    pub platform_percentage: Percent,
    pub yearly_revenue: Vec<YearlyRevenueSplit>,
    pub total_revenue: Money,
    pub client_revenue: Money,
    pub agent_revenue: Money,
    pub platform_revenue: Money,
}

/// Compute proposal metrics against a known price table.
///
/// The table is used as given, so callers holding a raw settings table run it
/// through [`current_and_future`](crate::pricing::current_and_future) first.
/// Negative prices never produce revenue.
pub fn calculate_proposal_metrics(
    input: &ProposalInput,
    prices: &PriceTable,
    config: &EngineConfig,
) -> CarbonResult<ComputationOutput<ProposalMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(portfolio) = input.portfolio_kwp {
        if portfolio < Decimal::ZERO {
            return Err(CarbonError::InvalidInput {
                field: "portfolio_kwp".into(),
                reason: "Portfolio size cannot be negative".into(),
            });
        }
    }

    let projector = RevenueProjector::from_config(config);
    let system_size_kwp = normalize_size(&input.system_size, input.unit);
    if system_size_kwp.is_zero() {
        warnings.push(format!(
            "System size {:?} did not parse to a positive kWp value; all figures are zero",
            input.system_size
        ));
    }

    let portfolio_size_kwp = input.portfolio_kwp.unwrap_or_else(|| {
        system_size_kwp.saturating_add(portfolio_size_kwp(&input.existing_systems, input.unit))
    });
    if portfolio_size_kwp < system_size_kwp {
        warnings.push(format!(
            "Portfolio size ({portfolio_size_kwp} kWp) is smaller than the proposed system ({system_size_kwp} kWp)"
        ));
    }

    if let Some(date) = input.commission_date {
        let effective = projector.effective_commission_date(Some(date));
        if effective != Some(date) {
            warnings.push(format!(
                "Commissioning date {date} precedes {}; projected from Jan 1 {}",
                projector.floor_year, projector.floor_year
            ));
        }
    }
    if prices.is_empty() {
        warnings.push("No carbon prices configured; revenue projection is empty".into());
    }

    let split = ShareSplit::for_portfolio(portfolio_size_kwp);
    let yearly_revenue =
        projector.revenue_split(system_size_kwp, input.commission_date, prices, &split);

    let total_revenue: Money = saturating_sum(yearly_revenue.iter().map(|r| r.total));
    let client_revenue: Money = saturating_sum(yearly_revenue.iter().map(|r| r.client));
    let agent_revenue: Money = saturating_sum(yearly_revenue.iter().map(|r| r.agent));
    let platform_revenue: Money = saturating_sum(yearly_revenue.iter().map(|r| r.platform));

    let output = ProposalMetrics {
        system_size_kwp,
        portfolio_size_kwp,
        annual_energy: projector.model.annual_energy(system_size_kwp),
        carbon_credits: projector.model.carbon_credits(system_size_kwp),
        client_share_percentage: split.client_share_percentage,
        agent_commission_percentage: split.agent_commission_percentage,
        platform_percentage: split.platform_percentage,
        yearly_revenue,
        total_revenue,
        client_revenue,
        agent_revenue,
        platform_revenue,
    };

    let assumptions = serde_json::json!({
        "average_sun_hours": projector.model.average_sun_hours.to_string(),
        "days_per_year": projector.model.days_per_year,
        "emission_factor_t_per_mwh": projector.model.emission_factor.to_string(),
        "projection_floor_year": projector.floor_year,
        "priced_years": prices.keys().collect::<Vec<_>>(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Solar carbon credits: kWp x sun hours x days -> kWh; kWh / 1000 x grid factor -> tCO2; \
         tCO2 x yearly price, commissioning year pro-rated by day, split by portfolio tier",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Compute proposal metrics with the live (cached) price table.
pub async fn project_proposal(
    input: &ProposalInput,
    prices: &DynamicPriceSource,
    config: &EngineConfig,
) -> CarbonResult<ComputationOutput<ProposalMetrics>> {
    let table = prices.prices().await;
    calculate_proposal_metrics(input, &table, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{current_and_future, RawPriceTable};
    use rust_decimal_macros::dec;

    fn base_input() -> ProposalInput {
        ProposalInput {
            system_size: SystemSize::from("100 kWp"),
            unit: None,
            commission_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            existing_systems: vec![],
            portfolio_kwp: None,
        }
    }

    fn prices() -> PriceTable {
        PriceTable::from([(2025, dec!(78.36)), (2026, dec!(93.19))])
    }

    #[test]
    fn test_basic_metrics() {
        let out = calculate_proposal_metrics(&base_input(), &prices(), &EngineConfig::default())
            .unwrap();
        let m = out.result;
        assert_eq!(m.system_size_kwp, dec!(100));
        assert_eq!(m.annual_energy, dec!(164250));
        assert_eq!(m.carbon_credits, dec!(169.67025));
        assert_eq!(m.client_share_percentage, dec!(63));
        assert_eq!(m.agent_commission_percentage, dec!(4));
        assert_eq!(m.platform_percentage, dec!(33));
        assert_eq!(m.total_revenue, dec!(13295) + dec!(15812));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_existing_systems_raise_tier() {
        let mut input = base_input();
        input.existing_systems = vec![SystemSize::from("20 MWp")];
        let m = calculate_proposal_metrics(&input, &prices(), &EngineConfig::default())
            .unwrap()
            .result;
        assert_eq!(m.portfolio_size_kwp, dec!(20100));
        assert_eq!(m.client_share_percentage, dec!(70));
        assert_eq!(m.agent_commission_percentage, dec!(7));
    }

    #[test]
    fn test_negative_portfolio_rejected() {
        let mut input = base_input();
        input.portfolio_kwp = Some(dec!(-1));
        assert!(calculate_proposal_metrics(&input, &prices(), &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_unparseable_size_warns() {
        let mut input = base_input();
        input.system_size = SystemSize::from("tbd");
        let out =
            calculate_proposal_metrics(&input, &prices(), &EngineConfig::default()).unwrap();
        assert_eq!(out.result.total_revenue, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_empty_prices_warns() {
        let out = calculate_proposal_metrics(
            &base_input(),
            &PriceTable::new(),
            &EngineConfig::default(),
        )
        .unwrap();
        assert!(out.result.yearly_revenue.is_empty());
        assert!(out.warnings.iter().any(|w| w.contains("No carbon prices")));
    }

    #[test]
    fn test_floored_commission_date_warns() {
        let mut input = base_input();
        input.commission_date = NaiveDate::from_ymd_opt(2022, 4, 1);
        let out =
            calculate_proposal_metrics(&input, &prices(), &EngineConfig::default()).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("precedes 2025")));
    }

    #[test]
    fn test_past_years_excluded_after_filtering() {
        let raw = RawPriceTable::from([
            ("2020".to_string(), dec!(50)),
            ("2025".to_string(), dec!(78.36)),
        ]);
        let mut input = base_input();
        input.commission_date = None;
        let table = current_and_future(&raw, 2025);
        let m = calculate_proposal_metrics(&input, &table, &EngineConfig::default())
            .unwrap()
            .result;
        let years: Vec<i32> = m.yearly_revenue.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2025]);
        assert_eq!(m.total_revenue, dec!(13295));
    }

    #[test]
    fn test_negative_price_yields_no_revenue() {
        let table = PriceTable::from([(2030, dec!(-10))]);
        let m = calculate_proposal_metrics(&base_input(), &table, &EngineConfig::default())
            .unwrap()
            .result;
        assert!(m.yearly_revenue.is_empty());
        assert_eq!(m.total_revenue, Decimal::ZERO);
    }

    #[test]
    fn test_huge_size_degrades_without_panicking() {
        let mut input = base_input();
        input.system_size = SystemSize::from("79228162514264337593543950335 MWp");
        input.existing_systems = vec![SystemSize::Number(Decimal::MAX)];
        let out =
            calculate_proposal_metrics(&input, &prices(), &EngineConfig::default()).unwrap();
        assert_eq!(out.result.system_size_kwp, Decimal::ZERO);
        assert_eq!(out.result.total_revenue, Decimal::ZERO);
        assert_eq!(out.result.portfolio_size_kwp, Decimal::MAX);
    }

    #[test]
    fn test_input_from_json() {
        let input: ProposalInput = serde_json::from_str(
            r#"{"system_size": "1.2 MWp", "commission_date": "2026-07-01",
                "existing_systems": [500, "3 MWp"]}"#,
        )
        .unwrap();
        let m = calculate_proposal_metrics(&input, &prices(), &EngineConfig::default())
            .unwrap()
            .result;
        assert_eq!(m.system_size_kwp, dec!(1200));
        assert_eq!(m.portfolio_size_kwp, dec!(4700));
        assert_eq!(m.yearly_revenue.len(), 1);
        assert_eq!(m.yearly_revenue[0].year, 2026);
    }
}
