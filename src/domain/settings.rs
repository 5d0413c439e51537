//! Marketing settings injected into the aggregator.
//!
//! Production estimates, cost of production and status bands are user
//! configuration, read once from the config file and passed explicitly into
//! every computation that needs them.

use std::collections::BTreeMap;

use super::config_validation::{optional_integer, optional_number};
use super::crop::Crop;
use super::error::GrainError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_CROP_YEAR: i32 = 2026;
pub const DEFAULT_AHEAD_PCT: f64 = 60.0;
pub const DEFAULT_ON_TRACK_PCT: f64 = 30.0;
pub const DEFAULT_RANK_SIZE: usize = 3;
pub const DEFAULT_TARGET_MARGIN_PCT: f64 = 15.0;

/// Percent-sold thresholds for [`MarketingStatus`](super::exposure::MarketingStatus).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusBands {
    pub ahead_pct: f64,
    pub on_track_pct: f64,
}

impl Default for StatusBands {
    fn default() -> Self {
        StatusBands {
            ahead_pct: DEFAULT_AHEAD_PCT,
            on_track_pct: DEFAULT_ON_TRACK_PCT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSettings {
    /// Estimated total production in bushels.
    pub estimated_bushels: f64,
    /// Cost of production, $/bu.
    pub cost_per_bushel: f64,
    pub target_margin_pct: f64,
}

impl CropSettings {
    pub fn defaults_for(crop: Crop) -> Self {
        match crop {
            Crop::Corn => CropSettings {
                estimated_bushels: 50_000.0,
                cost_per_bushel: 4.20,
                target_margin_pct: DEFAULT_TARGET_MARGIN_PCT,
            },
            Crop::Soybeans => CropSettings {
                estimated_bushels: 15_000.0,
                cost_per_bushel: 10.50,
                target_margin_pct: DEFAULT_TARGET_MARGIN_PCT,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketingSettings {
    pub default_crop_year: i32,
    pub bands: StatusBands,
    pub rank_size: usize,
    pub crops: BTreeMap<Crop, CropSettings>,
}

impl Default for MarketingSettings {
    fn default() -> Self {
        MarketingSettings {
            default_crop_year: DEFAULT_CROP_YEAR,
            bands: StatusBands::default(),
            rank_size: DEFAULT_RANK_SIZE,
            crops: Crop::ALL
                .into_iter()
                .map(|c| (c, CropSettings::defaults_for(c)))
                .collect(),
        }
    }
}

impl MarketingSettings {
    pub fn crop(&self, crop: Crop) -> CropSettings {
        self.crops
            .get(&crop)
            .copied()
            .unwrap_or_else(|| CropSettings::defaults_for(crop))
    }

    pub fn estimated_bushels(&self, crop: Crop) -> f64 {
        self.crop(crop).estimated_bushels
    }

    /// Build settings from `[marketing]`, `[production]`, `[cost]` and
    /// `[margin]`. Missing keys fall back to defaults; malformed ones are
    /// errors.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GrainError> {
        let rank_size =
            optional_integer(config, "marketing", "rank_size")?.unwrap_or(DEFAULT_RANK_SIZE as i64);
        if rank_size < 1 {
            return Err(GrainError::ConfigInvalid {
                section: "marketing".into(),
                key: "rank_size".into(),
                reason: "rank_size must be at least 1".into(),
            });
        }
        let default_crop_year = optional_integer(config, "marketing", "default_crop_year")?
            .unwrap_or(DEFAULT_CROP_YEAR as i64);
        let default_crop_year = i32::try_from(default_crop_year).map_err(|_| {
            GrainError::ConfigInvalid {
                section: "marketing".into(),
                key: "default_crop_year".into(),
                reason: format!("{default_crop_year} is not a year"),
            }
        })?;

        let mut crops = BTreeMap::new();
        for crop in Crop::ALL {
            let d = CropSettings::defaults_for(crop);
            let key = crop.as_str();
            crops.insert(
                crop,
                CropSettings {
                    estimated_bushels: optional_number(config, "production", key)?
                        .unwrap_or(d.estimated_bushels),
                    cost_per_bushel: optional_number(config, "cost", key)?.unwrap_or(d.cost_per_bushel),
                    target_margin_pct: optional_number(config, "margin", key)?
                        .unwrap_or(d.target_margin_pct),
                },
            );
        }

        Ok(MarketingSettings {
            default_crop_year,
            bands: StatusBands {
                ahead_pct: optional_number(config, "marketing", "ahead_pct")?
                    .unwrap_or(DEFAULT_AHEAD_PCT),
                on_track_pct: optional_number(config, "marketing", "on_track_pct")?
                    .unwrap_or(DEFAULT_ON_TRACK_PCT),
            },
            rank_size: rank_size as usize,
            crops,
        })
    }
}
