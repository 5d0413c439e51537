//! Exposure and revenue aggregation over open contracts.
//!
//! Every function here is pure: it takes the contracts and snapshot read by
//! the caller and never touches a store. Quantities that cannot be computed
//! (no contracts, no production estimate, no market price) are `None`, never
//! zero.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::contract::Contract;
use super::crop::{ContractType, Crop};
use super::pricing;
use super::settings::{MarketingSettings, StatusBands};
use super::snapshot::MarketSnapshot;

/// Marketing progress band for a percent-sold figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketingStatus {
    Ahead,
    OnTrack,
    Behind,
}

impl MarketingStatus {
    pub fn classify(percent_sold: f64, bands: &StatusBands) -> Self {
        if percent_sold >= bands.ahead_pct {
            MarketingStatus::Ahead
        } else if percent_sold >= bands.on_track_pct {
            MarketingStatus::OnTrack
        } else {
            MarketingStatus::Behind
        }
    }
}

impl fmt::Display for MarketingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarketingStatus::Ahead => "ahead",
            MarketingStatus::OnTrack => "on track",
            MarketingStatus::Behind => "behind",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExposureSummary {
    pub crop: Crop,
    /// `None` when the summary spans every crop year.
    pub crop_year: Option<i32>,
    pub contract_count: usize,
    pub contracted_bushels: f64,
    pub weighted_average_price: Option<f64>,
    pub estimated_total_bushels: f64,
    /// Unclamped. Use [`ExposureSummary::percent_sold_display`] for display.
    pub percent_sold: Option<f64>,
    pub status: Option<MarketingStatus>,
    pub contracted_revenue: f64,
    pub uncontracted_bushels: f64,
    pub market_cash_price: Option<f64>,
    pub uncontracted_potential_revenue: Option<f64>,
    pub total_potential_revenue: Option<f64>,
}

impl ExposureSummary {
    pub fn percent_sold_display(&self) -> Option<f64> {
        self.percent_sold.map(|p| p.min(100.0))
    }
}

/// Open contracts of `crop` (and `crop_year`, when given).
pub fn open_positions<'c>(
    contracts: &'c [Contract],
    crop: Crop,
    crop_year: Option<i32>,
    default_year: i32,
) -> impl Iterator<Item = &'c Contract> {
    contracts.iter().filter(move |c| {
        c.is_open()
            && c.crop == crop
            && crop_year.is_none_or(|y| c.effective_crop_year(default_year) == y)
    })
}

pub fn weighted_average_price<'c, I>(contracts: I) -> Option<f64>
where
    I: IntoIterator<Item = &'c Contract>,
{
    pricing::weighted_average(contracts.into_iter().map(|c| (c.cash_price(), c.bushels)))
}

pub fn compute_exposure(
    contracts: &[Contract],
    crop: Crop,
    crop_year: Option<i32>,
    latest: Option<&MarketSnapshot>,
    settings: &MarketingSettings,
) -> ExposureSummary {
    let open: Vec<&Contract> =
        open_positions(contracts, crop, crop_year, settings.default_crop_year).collect();
    let contracted_bushels: f64 = open.iter().map(|c| c.bushels).sum();
    let contracted_revenue: f64 = open.iter().map(|c| c.revenue()).sum();
    let weighted_average_price = weighted_average_price(open.iter().copied());

    let estimated_total_bushels = settings.estimated_bushels(crop);
    let percent_sold = (estimated_total_bushels > 0.0)
        .then(|| 100.0 * contracted_bushels / estimated_total_bushels);
    let status = percent_sold.map(|p| MarketingStatus::classify(p, &settings.bands));

    let uncontracted_bushels = (estimated_total_bushels - contracted_bushels).max(0.0);
    let market_cash_price = latest.filter(|s| s.crop == crop).map(|s| s.cash_price);
    let uncontracted_potential_revenue = if uncontracted_bushels == 0.0 {
        Some(0.0)
    } else {
        market_cash_price.map(|price| uncontracted_bushels * price)
    };
    let total_potential_revenue = uncontracted_potential_revenue.map(|u| contracted_revenue + u);

    if market_cash_price.is_none() {
        debug!(%crop, "no market snapshot: uncontracted revenue undefined");
    }

    ExposureSummary {
        crop,
        crop_year,
        contract_count: open.len(),
        contracted_bushels,
        weighted_average_price,
        estimated_total_bushels,
        percent_sold,
        status,
        contracted_revenue,
        uncontracted_bushels,
        market_cash_price,
        uncontracted_potential_revenue,
        total_potential_revenue,
    }
}

/// Highest and lowest priced open contracts.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractRanking {
    /// Descending by futures price.
    pub best: Vec<Contract>,
    /// Ascending by futures price.
    pub worst: Vec<Contract>,
}

/// Top-`k` best and worst open contracts by futures price. With fewer than
/// `2k` open contracts the two lists overlap.
pub fn rank_contracts(contracts: &[Contract], k: usize) -> ContractRanking {
    let mut open: Vec<&Contract> = contracts.iter().filter(|c| c.is_open()).collect();
    open.sort_by(|a, b| b.futures_price.total_cmp(&a.futures_price));
    let best = open.iter().take(k).map(|c| (*c).clone()).collect();
    let worst = open.iter().rev().take(k).map(|c| (*c).clone()).collect();
    ContractRanking { best, worst }
}

/// Weighted average cash price of one crop/contract-type group.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAverage {
    pub crop: Crop,
    pub contract_type: ContractType,
    pub bushels: f64,
    pub average_price: Option<f64>,
}

pub fn average_price_by_type(contracts: &[Contract]) -> Vec<TypeAverage> {
    let mut groups: BTreeMap<(Crop, ContractType), Vec<&Contract>> = BTreeMap::new();
    for c in contracts.iter().filter(|c| c.is_open()) {
        groups.entry((c.crop, c.contract_type)).or_default().push(c);
    }
    groups
        .into_iter()
        .map(|((crop, contract_type), group)| TypeAverage {
            crop,
            contract_type,
            bushels: group.iter().map(|c| c.bushels).sum(),
            average_price: weighted_average_price(group),
        })
        .collect()
}

/// Contracted position of one crop in one crop year.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRow {
    pub crop: Crop,
    pub crop_year: i32,
    pub contract_count: usize,
    pub bushels: f64,
    pub average_price: Option<f64>,
}

/// Open positions grouped by crop and effective crop year.
pub fn position_summary(contracts: &[Contract], default_year: i32) -> Vec<PositionRow> {
    let mut groups: BTreeMap<(Crop, i32), Vec<&Contract>> = BTreeMap::new();
    for c in contracts.iter().filter(|c| c.is_open()) {
        groups
            .entry((c.crop, c.effective_crop_year(default_year)))
            .or_default()
            .push(c);
    }
    groups
        .into_iter()
        .map(|((crop, crop_year), group)| PositionRow {
            crop,
            crop_year,
            contract_count: group.len(),
            bushels: group.iter().map(|c| c.bushels).sum(),
            average_price: weighted_average_price(group),
        })
        .collect()
}
