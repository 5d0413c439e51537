//! Price/basis threshold alerts and their on-demand evaluation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::crop::Crop;
use super::error::GrainError;
use super::snapshot::{MarketSnapshot, SnapshotStore};
use crate::ports::alert_port::AlertPort;
use crate::ports::clock_port::ClockPort;

const ENTITY: &str = "alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    PriceAbove,
    PriceBelow,
    BasisAbove,
    BasisBelow,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::PriceAbove => "price_above",
            AlertType::PriceBelow => "price_below",
            AlertType::BasisAbove => "basis_above",
            AlertType::BasisBelow => "basis_below",
        }
    }

    /// The snapshot field this alert watches: futures $/bu or basis cents.
    pub fn observed(&self, snapshot: &MarketSnapshot) -> f64 {
        match self {
            AlertType::PriceAbove | AlertType::PriceBelow => snapshot.futures_price,
            AlertType::BasisAbove | AlertType::BasisBelow => snapshot.basis,
        }
    }

    fn breached(&self, observed: f64, target: f64) -> bool {
        match self {
            AlertType::PriceAbove | AlertType::BasisAbove => observed > target,
            AlertType::PriceBelow | AlertType::BasisBelow => observed < target,
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = GrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "price_above" => Ok(AlertType::PriceAbove),
            "price_below" => Ok(AlertType::PriceBelow),
            "basis_above" => Ok(AlertType::BasisAbove),
            "basis_below" => Ok(AlertType::BasisBelow),
            _ => Err(GrainError::validation(
                "alert_type",
                format!("unknown alert type '{s}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    pub crop: Crop,
    pub alert_type: AlertType,
    /// $/bu for price alerts, cents/bu for basis alerts.
    pub target_value: f64,
    pub futures_month: Option<String>,
    pub active: bool,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AlertDraft {
    pub crop: Crop,
    pub alert_type: AlertType,
    pub target_value: f64,
    pub futures_month: Option<String>,
}

/// Partial update. `Some(None)` clears the month filter.
#[derive(Debug, Clone, Default)]
pub struct AlertPatch {
    pub target_value: Option<f64>,
    pub futures_month: Option<Option<String>>,
    pub active: Option<bool>,
    pub notified: Option<bool>,
}

/// Satisfaction of an alert against the crop's market.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertStatus {
    pub alert: Alert,
    /// `None` when no matching snapshot exists.
    pub satisfied: Option<bool>,
    pub observed: Option<f64>,
}

/// Whether `snapshot` breaches `alert`.
///
/// `None` when there is no snapshot, or when the alert is pinned to a futures
/// month the snapshot does not quote.
pub fn evaluate(alert: &Alert, snapshot: Option<&MarketSnapshot>) -> Option<bool> {
    let snapshot = snapshot.filter(|s| s.crop == alert.crop)?;
    if let Some(month) = &alert.futures_month {
        if !snapshot.futures_month.eq_ignore_ascii_case(month.trim()) {
            return None;
        }
    }
    Some(
        alert
            .alert_type
            .breached(alert.alert_type.observed(snapshot), alert.target_value),
    )
}

fn validate_target(target: f64) -> Result<(), GrainError> {
    if !target.is_finite() {
        return Err(GrainError::validation(
            "target_value",
            "target value must be a finite number",
        ));
    }
    Ok(())
}

fn normalize_month(month: Option<String>) -> Option<String> {
    month
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

/// Alert CRUD plus evaluation against the snapshot store.
pub struct AlertBook<'a> {
    store: &'a dyn AlertPort,
    clock: &'a dyn ClockPort,
}

impl<'a> AlertBook<'a> {
    pub fn new(store: &'a dyn AlertPort, clock: &'a dyn ClockPort) -> Self {
        Self { store, clock }
    }

    pub fn create(&self, draft: AlertDraft) -> Result<Alert, GrainError> {
        validate_target(draft.target_value)?;
        let alert = Alert {
            id: Uuid::new_v4().to_string(),
            crop: draft.crop,
            alert_type: draft.alert_type,
            target_value: draft.target_value,
            futures_month: normalize_month(draft.futures_month),
            active: true,
            notified: false,
            created_at: self.clock.now(),
        };
        self.store.insert_alert(&alert)?;
        info!(id = %alert.id, crop = %alert.crop, kind = %alert.alert_type, target = alert.target_value, "alert created");
        Ok(alert)
    }

    pub fn get(&self, id: &str) -> Result<Alert, GrainError> {
        self.store
            .get_alert(id)?
            .ok_or_else(|| GrainError::not_found(ENTITY, id))
    }

    pub fn update(&self, id: &str, patch: AlertPatch) -> Result<Alert, GrainError> {
        if let Some(target) = patch.target_value {
            validate_target(target)?;
        }
        let mut alert = self.get(id)?;
        if let Some(target) = patch.target_value {
            alert.target_value = target;
        }
        if let Some(month) = patch.futures_month {
            alert.futures_month = normalize_month(month);
        }
        if let Some(active) = patch.active {
            alert.active = active;
        }
        if let Some(notified) = patch.notified {
            alert.notified = notified;
        }
        if !self.store.replace_alert(&alert)? {
            return Err(GrainError::not_found(ENTITY, id));
        }
        info!(id = %alert.id, active = alert.active, "alert updated");
        Ok(alert)
    }

    pub fn dismiss(&self, id: &str) -> Result<Alert, GrainError> {
        self.update(
            id,
            AlertPatch {
                active: Some(false),
                ..Default::default()
            },
        )
    }

    pub fn delete(&self, id: &str) -> Result<(), GrainError> {
        if !self.store.delete_alert(id)? {
            return Err(GrainError::not_found(ENTITY, id));
        }
        info!(id, "alert deleted");
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<Alert>, GrainError> {
        self.store.list_alerts()
    }

    pub fn list_active(&self) -> Result<Vec<Alert>, GrainError> {
        Ok(self
            .store
            .list_alerts()?
            .into_iter()
            .filter(|a| a.active)
            .collect())
    }

    /// Evaluate one alert against the snapshot it is pinned to.
    pub fn status_of(&self, alert: Alert, market: &SnapshotStore<'_>) -> Result<AlertStatus, GrainError> {
        let snapshot = match &alert.futures_month {
            Some(month) => market.latest_for_month(alert.crop, month)?,
            None => market.latest(alert.crop)?,
        };
        let satisfied = evaluate(&alert, snapshot.as_ref());
        if satisfied.is_none() {
            debug!(id = %alert.id, crop = %alert.crop, "alert cannot be evaluated: no matching snapshot");
        }
        Ok(AlertStatus {
            observed: snapshot.as_ref().map(|s| alert.alert_type.observed(s)),
            satisfied,
            alert,
        })
    }

    /// Evaluate every active alert, optionally for one crop. Never changes
    /// alert state.
    pub fn evaluate_all(
        &self,
        crop: Option<Crop>,
        market: &SnapshotStore<'_>,
    ) -> Result<Vec<AlertStatus>, GrainError> {
        self.list_active()?
            .into_iter()
            .filter(|a| crop.is_none_or(|c| a.crop == c))
            .map(|a| self.status_of(a, market))
            .collect()
    }
}
