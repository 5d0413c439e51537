//! Categorical keys shared by contracts, snapshots and alerts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::GrainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crop {
    Corn,
    Soybeans,
}

impl Crop {
    pub const ALL: [Crop; 2] = [Crop::Corn, Crop::Soybeans];

    pub fn as_str(&self) -> &'static str {
        match self {
            Crop::Corn => "corn",
            Crop::Soybeans => "soybeans",
        }
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Crop {
    type Err = GrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "corn" => Ok(Crop::Corn),
            "soybeans" | "soybean" | "beans" | "soy" => Ok(Crop::Soybeans),
            other => Err(GrainError::validation(
                "crop",
                format!("unknown crop '{other}' (expected corn or soybeans)"),
            )),
        }
    }
}

/// Contract kind. Informational only: pricing math is the same for every type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    Cash,
    Basis,
    Hta,
    Dp,
    FuturesOnly,
    MinPrice,
    Option,
}

impl ContractType {
    pub const ALL: [ContractType; 7] = [
        ContractType::Cash,
        ContractType::Basis,
        ContractType::Hta,
        ContractType::Dp,
        ContractType::FuturesOnly,
        ContractType::MinPrice,
        ContractType::Option,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Cash => "cash",
            ContractType::Basis => "basis",
            ContractType::Hta => "hta",
            ContractType::Dp => "dp",
            ContractType::FuturesOnly => "futures_only",
            ContractType::MinPrice => "min_price",
            ContractType::Option => "option",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractType {
    type Err = GrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ContractType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                GrainError::validation("contract_type", format!("unknown contract type '{s}'"))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    #[default]
    Open,
    Delivered,
    Cancelled,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Open => "open",
            ContractStatus::Delivered => "delivered",
            ContractStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = GrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(ContractStatus::Open),
            "delivered" => Ok(ContractStatus::Delivered),
            "cancelled" | "canceled" => Ok(ContractStatus::Cancelled),
            other => Err(GrainError::validation(
                "status",
                format!("unknown status '{other}'"),
            )),
        }
    }
}
