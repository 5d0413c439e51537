//! Marketing plan milestones and target pricing.

use std::fmt;

use chrono::NaiveDate;

use super::config_validation::optional_number;
use super::crop::Crop;
use super::error::GrainError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub name: String,
    pub target_date: NaiveDate,
    /// Share of estimated production to price by this milestone.
    pub pct_to_sell: f64,
    pub target_futures: f64,
    /// Cents/bu.
    pub target_basis: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneStatus {
    Hit,
    PastDue,
    Upcoming,
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MilestoneStatus::Hit => "hit",
            MilestoneStatus::PastDue => "past due",
            MilestoneStatus::Upcoming => "upcoming",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneProgress {
    pub milestone: Milestone,
    /// Running total of `pct_to_sell` up to and including this milestone.
    pub cumulative_pct: f64,
    pub status: MilestoneStatus,
}

/// Price needed to earn `margin_pct` over cost of production.
pub fn target_price(cost_per_bushel: f64, margin_pct: f64) -> f64 {
    cost_per_bushel * (1.0 + margin_pct / 100.0)
}

/// Status of each milestone, in date order.
///
/// A milestone is hit once the percent sold reaches its cumulative target.
/// An unknown percent sold never hits.
pub fn plan_progress(
    milestones: &[Milestone],
    percent_sold: Option<f64>,
    today: NaiveDate,
) -> Vec<MilestoneProgress> {
    let mut ordered: Vec<Milestone> = milestones.to_vec();
    ordered.sort_by_key(|m| m.target_date);

    let mut cumulative_pct = 0.0;
    ordered
        .into_iter()
        .map(|milestone| {
            cumulative_pct += milestone.pct_to_sell;
            let status = if percent_sold.is_some_and(|p| p >= cumulative_pct) {
                MilestoneStatus::Hit
            } else if milestone.target_date < today {
                MilestoneStatus::PastDue
            } else {
                MilestoneStatus::Upcoming
            };
            MilestoneProgress {
                milestone,
                cumulative_pct,
                status,
            }
        })
        .collect()
}

fn milestone(name: &str, date: Option<NaiveDate>, pct: f64, futures: f64, basis: f64) -> Option<Milestone> {
    Some(Milestone {
        name: name.to_string(),
        target_date: date?,
        pct_to_sell: pct,
        target_futures: futures,
        target_basis: basis,
    })
}

/// Built-in seasonal plan for `year`.
pub fn default_milestones(crop: Crop, year: i32) -> Vec<Milestone> {
    let d = |month| NaiveDate::from_ymd_opt(year, month, 1);
    let plan = match crop {
        Crop::Corn => vec![
            milestone("Pre-plant hedge", d(3), 20.0, 4.80, -35.0),
            milestone("Spring rally", d(5), 15.0, 5.00, -30.0),
            milestone("Summer high", d(7), 20.0, 5.20, -28.0),
            milestone("Harvest", d(10), 30.0, 4.60, -40.0),
            milestone("Post-harvest storage", d(12), 15.0, 4.75, -32.0),
        ],
        Crop::Soybeans => vec![
            milestone("Pre-plant hedge", d(3), 25.0, 10.80, -45.0),
            milestone("Summer high", d(7), 30.0, 11.20, -40.0),
            milestone("Harvest", d(10), 30.0, 10.40, -48.0),
            milestone("Post-harvest", d(12), 15.0, 10.60, -42.0),
        ],
    };
    plan.into_iter().flatten().collect()
}

/// Milestones from `[milestone.<crop>.<n>]` sections, or the built-in plan
/// when none are configured.
pub fn milestones_from_config(
    config: &dyn ConfigPort,
    crop: Crop,
    year: i32,
) -> Result<Vec<Milestone>, GrainError> {
    let prefix = format!("milestone.{}.", crop.as_str());
    let mut sections: Vec<String> = config
        .sections()
        .into_iter()
        .filter(|s| s.starts_with(&prefix))
        .collect();
    if sections.is_empty() {
        return Ok(default_milestones(crop, year));
    }
    sections.sort();

    sections
        .iter()
        .map(|section| {
            let date_str = config
                .get_string(section, "date")
                .ok_or_else(|| GrainError::ConfigMissing {
                    section: section.clone(),
                    key: "date".into(),
                })?;
            let target_date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|_| {
                GrainError::ConfigInvalid {
                    section: section.clone(),
                    key: "date".into(),
                    reason: "invalid date format (expected YYYY-MM-DD)".into(),
                }
            })?;
            let pct_to_sell = optional_number(config, section, "pct")?.unwrap_or(0.0);
            if !(0.0..=100.0).contains(&pct_to_sell) {
                return Err(GrainError::ConfigInvalid {
                    section: section.clone(),
                    key: "pct".into(),
                    reason: "pct must be between 0 and 100".into(),
                });
            }
            Ok(Milestone {
                name: config
                    .get_string(section, "name")
                    .unwrap_or_else(|| section[prefix.len()..].to_string()),
                target_date,
                pct_to_sell,
                target_futures: optional_number(config, section, "futures")?.unwrap_or(0.0),
                target_basis: optional_number(config, section, "basis")?.unwrap_or(0.0),
            })
        })
        .collect()
}
