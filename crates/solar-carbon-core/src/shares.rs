//! Tiered revenue share resolution.
//!
//! Client share and agent commission are looked up independently from the
//! portfolio size (kWp). Each table is scanned in ascending order and the
//! first `size < threshold` tier wins; sizes past the last threshold take the
//! top rate. The platform keeps the remainder.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{saturating_sum, Percent};
use crate::units::{normalize_size, CapacityUnit, SystemSize};

const ONE_HUNDRED: Decimal = dec!(100);

/// (upper bound kWp exclusive, client share %)
const CLIENT_SHARE_TIERS: [(Decimal, Decimal); 4] = [
    (dec!(5000), dec!(63)),
    (dec!(10000), dec!(66.5)),
    (dec!(20000), dec!(67.9)),
    (dec!(30000), dec!(70)),
];
const CLIENT_SHARE_TOP: Decimal = dec!(73.5);

/// (upper bound kWp exclusive, agent commission %)
const AGENT_COMMISSION_TIERS: [(Decimal, Decimal); 1] = [(dec!(15000), dec!(4))];
const AGENT_COMMISSION_TOP: Decimal = dec!(7);

fn lookup(tiers: &[(Decimal, Decimal)], top: Decimal, size_kwp: Decimal) -> Percent {
    tiers
        .iter()
        .find(|(threshold, _)| size_kwp < *threshold)
        .map(|(_, pct)| *pct)
        .unwrap_or(top)
}

/// Client share of carbon revenue (%) for a portfolio size in kWp.
pub fn client_share_percentage(portfolio_kwp: Decimal) -> Percent {
    lookup(&CLIENT_SHARE_TIERS, CLIENT_SHARE_TOP, portfolio_kwp)
}

/// Agent commission (%) for a portfolio size in kWp.
pub fn agent_commission_percentage(portfolio_kwp: Decimal) -> Percent {
    lookup(&AGENT_COMMISSION_TIERS, AGENT_COMMISSION_TOP, portfolio_kwp)
}

/// How carbon revenue is divided between client, agent and platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareSplit {
    pub client_share_percentage: Percent,
    pub agent_commission_percentage: Percent,
    pub platform_percentage: Percent,
}

impl ShareSplit {
    pub fn for_portfolio(portfolio_kwp: Decimal) -> Self {
        let client = client_share_percentage(portfolio_kwp);
        let agent = agent_commission_percentage(portfolio_kwp);
        Self {
            client_share_percentage: client,
            agent_commission_percentage: agent,
            platform_percentage: ONE_HUNDRED - client - agent,
        }
    }

    pub fn percentage(&self, party: Party) -> Percent {
        match party {
            Party::Client => self.client_share_percentage,
            Party::Agent => self.agent_commission_percentage,
            Party::Platform => self.platform_percentage,
        }
    }
}

/// A recipient of carbon revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Client,
    Agent,
    Platform,
}

/// Total normalized size (kWp) of a client's systems. Pinned at
/// `Decimal::MAX`, which resolves to the top tiers.
pub fn portfolio_size_kwp(systems: &[SystemSize], unit: Option<CapacityUnit>) -> Decimal {
    saturating_sum(systems.iter().map(|s| normalize_size(s, unit)))
}
