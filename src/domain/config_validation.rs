//! Configuration validation.
//!
//! Checks the marketing settings and elevator board sections before any
//! report reads them. Numeric keys are parsed strictly: a value that is
//! present but not a finite number is an error, never a silent default.

use crate::domain::contract::{MAX_CROP_YEAR, MIN_CROP_YEAR};
use crate::domain::crop::Crop;
use crate::domain::error::GrainError;
use crate::ports::config_port::ConfigPort;

pub fn validate_marketing_config(config: &dyn ConfigPort) -> Result<(), GrainError> {
    validate_crop_year(config)?;
    validate_status_bands(config)?;
    validate_rank_size(config)?;
    validate_production(config)?;
    validate_costs(config)?;
    Ok(())
}

pub fn validate_storage_config(config: &dyn ConfigPort) -> Result<(), GrainError> {
    if let Some(value) = optional_integer(config, "sqlite", "pool_size")? {
        if value < 1 {
            return Err(GrainError::ConfigInvalid {
                section: "sqlite".to_string(),
                key: "pool_size".to_string(),
                reason: "pool_size must be at least 1".to_string(),
            });
        }
    }
    Ok(())
}

/// A finite number, or `None` when the key is absent or blank.
pub fn optional_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, GrainError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(GrainError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{raw}' is not a finite number"),
        }),
    }
}

/// A whole number, or `None` when the key is absent or blank.
pub fn optional_integer(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<i64>, GrainError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<i64>().map(Some).map_err(|_| GrainError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("'{raw}' is not a whole number"),
    })
}

fn validate_crop_year(config: &dyn ConfigPort) -> Result<(), GrainError> {
    let Some(raw) = config.get_string("marketing", "default_crop_year") else {
        return Ok(());
    };
    let year = raw.trim().parse::<i64>().ok();
    match year {
        Some(y) if (MIN_CROP_YEAR as i64..=MAX_CROP_YEAR as i64).contains(&y) => Ok(()),
        _ => Err(GrainError::ConfigInvalid {
            section: "marketing".to_string(),
            key: "default_crop_year".to_string(),
            reason: format!("default_crop_year must be between {MIN_CROP_YEAR} and {MAX_CROP_YEAR}"),
        }),
    }
}

fn validate_status_bands(config: &dyn ConfigPort) -> Result<(), GrainError> {
    let ahead = optional_number(config, "marketing", "ahead_pct")?.unwrap_or(60.0);
    let on_track = optional_number(config, "marketing", "on_track_pct")?.unwrap_or(30.0);
    for (key, value) in [("ahead_pct", ahead), ("on_track_pct", on_track)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(GrainError::ConfigInvalid {
                section: "marketing".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be between 0 and 100"),
            });
        }
    }
    if on_track > ahead {
        return Err(GrainError::ConfigInvalid {
            section: "marketing".to_string(),
            key: "on_track_pct".to_string(),
            reason: "on_track_pct must not exceed ahead_pct".to_string(),
        });
    }
    Ok(())
}

fn validate_rank_size(config: &dyn ConfigPort) -> Result<(), GrainError> {
    let value = optional_integer(config, "marketing", "rank_size")?.unwrap_or(3);
    if value < 1 {
        return Err(GrainError::ConfigInvalid {
            section: "marketing".to_string(),
            key: "rank_size".to_string(),
            reason: "rank_size must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_production(config: &dyn ConfigPort) -> Result<(), GrainError> {
    for crop in Crop::ALL {
        let value = optional_number(config, "production", crop.as_str())?;
        if value.is_some_and(|v| v < 0.0) {
            return Err(GrainError::ConfigInvalid {
                section: "production".to_string(),
                key: crop.as_str().to_string(),
                reason: "estimated production must be non-negative".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), GrainError> {
    for crop in Crop::ALL {
        if optional_number(config, "cost", crop.as_str())?.is_some_and(|v| v < 0.0) {
            return Err(GrainError::ConfigInvalid {
                section: "cost".to_string(),
                key: crop.as_str().to_string(),
                reason: "cost of production must be non-negative".to_string(),
            });
        }
        if optional_number(config, "margin", crop.as_str())?.is_some_and(|v| v < 0.0) {
            return Err(GrainError::ConfigInvalid {
                section: "margin".to_string(),
                key: crop.as_str().to_string(),
                reason: "target margin must be non-negative".to_string(),
            });
        }
    }
    Ok(())
}
