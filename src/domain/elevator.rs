//! Elevator basis board: net-back cash bids across local buyers.

use super::config_validation::optional_number;
use super::crop::Crop;
use super::error::GrainError;
use super::pricing;
use super::snapshot::MarketSnapshot;
use crate::ports::config_port::ConfigPort;

const SECTION_PREFIX: &str = "elevator.";

#[derive(Debug, Clone, PartialEq)]
pub struct Elevator {
    pub name: String,
    pub location: Option<String>,
    /// Posted basis in cents/bu; `None` when the elevator does not bid.
    pub corn_basis: Option<f64>,
    pub soybeans_basis: Option<f64>,
    /// Extra haul cost in $/bu subtracted for net-back pricing.
    pub haul_cost: f64,
    pub barge: bool,
}

impl Elevator {
    pub fn basis(&self, crop: Crop) -> Option<f64> {
        match crop {
            Crop::Corn => self.corn_basis,
            Crop::Soybeans => self.soybeans_basis,
        }
    }

    /// Cash bid net of haul cost.
    pub fn net_cash(&self, crop: Crop, futures: Option<f64>) -> Option<f64> {
        let basis = self.basis(crop)?;
        pricing::cash_price(futures, Some(basis)).map(|cash| cash - self.haul_cost)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevatorQuote {
    pub name: String,
    pub basis: Option<f64>,
    pub net_cash: Option<f64>,
    pub best_cash: bool,
    pub best_basis: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevatorBoard {
    pub crop: Crop,
    pub futures_price: Option<f64>,
    pub quotes: Vec<ElevatorQuote>,
}

impl ElevatorBoard {
    pub fn best_cash(&self) -> Option<&ElevatorQuote> {
        self.quotes.iter().find(|q| q.best_cash)
    }

    pub fn best_basis(&self) -> Option<&ElevatorQuote> {
        self.quotes.iter().find(|q| q.best_basis)
    }
}

fn max_of<I: IntoIterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    values.into_iter().flatten().reduce(f64::max)
}

/// Quote every elevator against the crop's latest futures. Ties for best are
/// all flagged.
pub fn elevator_board(elevators: &[Elevator], crop: Crop, latest: Option<&MarketSnapshot>) -> ElevatorBoard {
    let futures_price = latest.filter(|s| s.crop == crop).map(|s| s.futures_price);
    let mut quotes: Vec<ElevatorQuote> = elevators
        .iter()
        .map(|e| ElevatorQuote {
            name: e.name.clone(),
            basis: e.basis(crop),
            net_cash: e.net_cash(crop, futures_price),
            best_cash: false,
            best_basis: false,
        })
        .collect();

    let best_cash = max_of(quotes.iter().map(|q| q.net_cash));
    let best_basis = max_of(quotes.iter().map(|q| q.basis));
    for q in &mut quotes {
        q.best_cash = q.net_cash.is_some() && q.net_cash == best_cash;
        q.best_basis = q.basis.is_some() && q.basis == best_basis;
    }

    ElevatorBoard {
        crop,
        futures_price,
        quotes,
    }
}

/// Elevators from `[elevator.<name>]` sections, sorted by section name.
pub fn elevators_from_config(config: &dyn ConfigPort) -> Result<Vec<Elevator>, GrainError> {
    let mut sections: Vec<String> = config
        .sections()
        .into_iter()
        .filter(|s| s.starts_with(SECTION_PREFIX))
        .collect();
    sections.sort();

    sections
        .iter()
        .map(|section| {
            let haul_cost = optional_number(config, section, "haul_cost")?.unwrap_or(0.0);
            if haul_cost < 0.0 {
                return Err(GrainError::ConfigInvalid {
                    section: section.clone(),
                    key: "haul_cost".into(),
                    reason: "haul_cost must be non-negative".into(),
                });
            }
            Ok(Elevator {
                name: config
                    .get_string(section, "name")
                    .unwrap_or_else(|| section[SECTION_PREFIX.len()..].to_string()),
                location: config.get_string(section, "location"),
                corn_basis: optional_number(config, section, "corn_basis")?,
                soybeans_basis: optional_number(config, section, "soybeans_basis")?,
                haul_cost,
                barge: config.get_bool(section, "barge", false),
            })
        })
        .collect()
}
