//! Market snapshots and the append-only snapshot store.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::crop::Crop;
use super::error::GrainError;
use super::pricing;
use crate::ports::clock_port::ClockPort;
use crate::ports::snapshot_port::SnapshotPort;

/// One observed price point for one crop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub id: String,
    pub crop: Crop,
    pub futures_month: String,
    pub futures_price: f64,
    pub cash_price: f64,
    /// Cents/bu.
    pub basis: f64,
    pub implied_vol: Option<f64>,
    pub snapshot_at: DateTime<Utc>,
}

/// Input for [`SnapshotStore::record`].
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub crop: Crop,
    pub futures_month: String,
    pub futures_price: f64,
    pub cash_price: f64,
    /// Derived from the two prices when absent.
    pub basis_cents: Option<f64>,
    pub implied_vol: Option<f64>,
}

impl SnapshotEntry {
    pub fn validate(&self) -> Result<(), GrainError> {
        if self.futures_month.trim().is_empty() {
            return Err(GrainError::validation(
                "futures_month",
                "futures month is required",
            ));
        }
        for (field, value) in [
            ("futures_price", self.futures_price),
            ("cash_price", self.cash_price),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GrainError::validation(
                    field,
                    format!("{field} must be positive, got {value}"),
                ));
            }
        }
        if self.basis_cents.is_some_and(|b| !b.is_finite()) {
            return Err(GrainError::validation("basis", "basis must be finite"));
        }
        if self.implied_vol.is_some_and(|v| !v.is_finite() || v < 0.0) {
            return Err(GrainError::validation(
                "implied_vol",
                "implied volatility must be zero or positive",
            ));
        }
        Ok(())
    }

    fn into_snapshot(self, at: DateTime<Utc>) -> MarketSnapshot {
        let basis = self
            .basis_cents
            .unwrap_or_else(|| pricing::basis_cents(self.cash_price, self.futures_price));
        MarketSnapshot {
            id: Uuid::new_v4().to_string(),
            crop: self.crop,
            futures_month: self.futures_month.trim().to_string(),
            futures_price: self.futures_price,
            cash_price: self.cash_price,
            basis,
            implied_vol: self.implied_vol,
            snapshot_at: at,
        }
    }
}

/// Closing observation of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPrice {
    pub date: NaiveDate,
    pub futures_price: f64,
    pub cash_price: f64,
    pub basis: f64,
}

/// Hook invoked after each recorded snapshot. Nothing is registered by
/// default; alerts are evaluated on demand.
pub trait SnapshotListener {
    fn on_recorded(&self, snapshot: &MarketSnapshot);
}

pub struct SnapshotStore<'a> {
    store: &'a dyn SnapshotPort,
    clock: &'a dyn ClockPort,
    listeners: Vec<&'a dyn SnapshotListener>,
}

impl<'a> SnapshotStore<'a> {
    pub fn new(store: &'a dyn SnapshotPort, clock: &'a dyn ClockPort) -> Self {
        Self {
            store,
            clock,
            listeners: Vec::new(),
        }
    }

    pub fn with_listener(mut self, listener: &'a dyn SnapshotListener) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn record(&self, entry: SnapshotEntry) -> Result<MarketSnapshot, GrainError> {
        entry.validate()?;
        let snapshot = entry.into_snapshot(self.clock.now());
        self.append(&snapshot)?;
        Ok(snapshot)
    }

    /// Record several entries under one shared timestamp. Every entry is
    /// validated before anything is written.
    pub fn record_all(&self, entries: Vec<SnapshotEntry>) -> Result<Vec<MarketSnapshot>, GrainError> {
        for entry in &entries {
            entry.validate()?;
        }
        let at = self.clock.now();
        let snapshots: Vec<MarketSnapshot> =
            entries.into_iter().map(|e| e.into_snapshot(at)).collect();
        for snapshot in &snapshots {
            self.append(snapshot)?;
        }
        Ok(snapshots)
    }

    /// Snapshot with the greatest `snapshot_at` for `crop`. Ties go to the
    /// most recently inserted row.
    pub fn latest(&self, crop: Crop) -> Result<Option<MarketSnapshot>, GrainError> {
        Ok(latest_of(self.store.snapshots_for(crop)?))
    }

    /// Latest snapshot for `crop` quoted against `futures_month`.
    pub fn latest_for_month(
        &self,
        crop: Crop,
        futures_month: &str,
    ) -> Result<Option<MarketSnapshot>, GrainError> {
        let wanted = futures_month.trim();
        Ok(latest_of(
            self.store
                .snapshots_for(crop)?
                .into_iter()
                .filter(|s| s.futures_month.eq_ignore_ascii_case(wanted)),
        ))
    }

    /// Snapshots no older than `since_days` days, oldest first.
    pub fn history(&self, crop: Crop, since_days: i64) -> Result<Vec<MarketSnapshot>, GrainError> {
        if since_days <= 0 {
            return Err(GrainError::validation(
                "since_days",
                format!("history window must be a positive number of days, got {since_days}"),
            ));
        }
        // A window reaching past chrono's range has no lower bound.
        let cutoff = Duration::try_days(since_days)
            .and_then(|window| self.clock.now().checked_sub_signed(window));
        let mut rows: Vec<MarketSnapshot> = self
            .store
            .snapshots_for(crop)?
            .into_iter()
            .filter(|s| cutoff.is_none_or(|cutoff| s.snapshot_at >= cutoff))
            .collect();
        rows.sort_by_key(|s| s.snapshot_at);
        debug!(%crop, since_days, rows = rows.len(), "history query");
        Ok(rows)
    }

    /// One point per calendar day (UTC): the last snapshot of that day.
    pub fn daily_series(&self, crop: Crop, since_days: i64) -> Result<Vec<DailyPrice>, GrainError> {
        let mut series: Vec<DailyPrice> = Vec::new();
        for s in self.history(crop, since_days)? {
            let point = DailyPrice {
                date: s.snapshot_at.date_naive(),
                futures_price: s.futures_price,
                cash_price: s.cash_price,
                basis: s.basis,
            };
            match series.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => series.push(point),
            }
        }
        Ok(series)
    }

    fn append(&self, snapshot: &MarketSnapshot) -> Result<(), GrainError> {
        self.store.append_snapshot(snapshot)?;
        info!(
            id = %snapshot.id,
            crop = %snapshot.crop,
            futures = snapshot.futures_price,
            basis = snapshot.basis,
            "snapshot recorded"
        );
        for listener in &self.listeners {
            listener.on_recorded(snapshot);
        }
        Ok(())
    }
}

fn latest_of<I>(rows: I) -> Option<MarketSnapshot>
where
    I: IntoIterator<Item = MarketSnapshot>,
{
    rows.into_iter().fold(None, |best, s| match best {
        Some(b) if b.snapshot_at > s.snapshot_at => Some(b),
        _ => Some(s),
    })
}

/// Parse a history window supplied as text.
pub fn parse_since_days(raw: &str) -> Result<i64, GrainError> {
    let days: i64 = raw.trim().parse().map_err(|_| {
        GrainError::validation("since_days", format!("'{raw}' is not a whole number of days"))
    })?;
    if days <= 0 {
        return Err(GrainError::validation(
            "since_days",
            format!("history window must be a positive number of days, got {days}"),
        ));
    }
    Ok(days)
}
