//! Sale contracts, their drafts/patches, and crop-year derivation.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use super::crop::{ContractStatus, ContractType, Crop};
use super::error::GrainError;
use super::pricing;

/// Earliest and latest crop year accepted on a contract.
pub const MIN_CROP_YEAR: i32 = 2000;
pub const MAX_CROP_YEAR: i32 = 2099;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub id: String,
    pub crop: Crop,
    pub contract_type: ContractType,
    pub bushels: f64,
    /// $/bu. Zero while a basis or DP contract waits for its futures fix.
    pub futures_price: f64,
    /// Cents/bu. `None` until the basis is set.
    pub basis: Option<f64>,
    pub futures_month: Option<String>,
    pub elevator: String,
    pub delivery: DeliveryWindow,
    pub status: ContractStatus,
    /// Explicitly stored crop year. When absent the year is derived from
    /// `futures_month`.
    pub crop_year: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Explicit crop year disagrees with the year encoded in the futures month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropYearConflict {
    pub explicit: i32,
    pub derived: i32,
}

impl Contract {
    pub fn cash_price(&self) -> f64 {
        self.futures_price + self.basis.unwrap_or(0.0) / pricing::CENTS_PER_DOLLAR
    }

    pub fn is_open(&self) -> bool {
        self.status == ContractStatus::Open
    }

    /// Cash value of the contract at its own price.
    pub fn revenue(&self) -> f64 {
        self.cash_price() * self.bushels
    }

    /// Crop year this contract counts against.
    pub fn effective_crop_year(&self, default_year: i32) -> i32 {
        self.crop_year
            .unwrap_or_else(|| derive_crop_year(self.futures_month.as_deref(), default_year))
    }

    pub fn crop_year_conflict(&self) -> Option<CropYearConflict> {
        let explicit = self.crop_year?;
        let derived = self.futures_month.as_deref().and_then(year_from_futures_month)?;
        (explicit != derived).then_some(CropYearConflict { explicit, derived })
    }

    pub fn delivers_in(&self, year: i32, month: u32) -> bool {
        self.delivery
            .end
            .is_some_and(|d| d.year() == year && d.month() == month)
    }

    pub(crate) fn apply(&mut self, patch: ContractPatch, now: DateTime<Utc>) {
        if let Some(crop) = patch.crop {
            self.crop = crop;
        }
        if let Some(contract_type) = patch.contract_type {
            self.contract_type = contract_type;
        }
        if let Some(bushels) = patch.bushels {
            self.bushels = bushels;
        }
        if let Some(price) = patch.futures_price {
            self.futures_price = price;
        }
        if let Some(basis) = patch.basis {
            self.basis = basis;
        }
        if let Some(month) = patch.futures_month {
            self.futures_month = month;
        }
        if let Some(elevator) = patch.elevator {
            self.elevator = elevator.trim().to_string();
        }
        if let Some(start) = patch.delivery_start {
            self.delivery.start = start;
        }
        if let Some(end) = patch.delivery_end {
            self.delivery.end = end;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(year) = patch.crop_year {
            self.crop_year = year;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self.updated_at = now;
    }
}

/// Two-digit year at the end of a futures month label ("Dec26" -> 2026).
pub fn year_from_futures_month(month: &str) -> Option<i32> {
    let trimmed = month.trim();
    let tail = trimmed.get(trimmed.len().checked_sub(2)?..)?;
    if !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse::<i32>().ok().map(|yy| 2000 + yy)
}

/// Crop year for a contract without an explicit one.
pub fn derive_crop_year(futures_month: Option<&str>, default_year: i32) -> i32 {
    futures_month
        .and_then(year_from_futures_month)
        .unwrap_or(default_year)
}

/// Input for creating a contract. Id and timestamps are assigned by the ledger.
#[derive(Debug, Clone, Default)]
pub struct ContractDraft {
    pub crop: Option<Crop>,
    pub contract_type: Option<ContractType>,
    pub bushels: f64,
    pub futures_price: f64,
    pub basis: Option<f64>,
    pub futures_month: Option<String>,
    pub elevator: String,
    pub delivery: DeliveryWindow,
    pub status: Option<ContractStatus>,
    pub crop_year: Option<i32>,
    pub notes: Option<String>,
}

impl ContractDraft {
    pub fn validate(&self) -> Result<(), GrainError> {
        if self.crop.is_none() {
            return Err(GrainError::validation("crop", "crop is required"));
        }
        if self.contract_type.is_none() {
            return Err(GrainError::validation(
                "contract_type",
                "contract type is required",
            ));
        }
        validate_bushels(self.bushels)?;
        validate_futures_price(self.futures_price)?;
        validate_basis(self.basis)?;
        validate_elevator(&self.elevator)?;
        validate_crop_year(self.crop_year)?;
        validate_window(self.delivery)?;
        Ok(())
    }

    pub(crate) fn into_contract(self, id: String, now: DateTime<Utc>) -> Result<Contract, GrainError> {
        self.validate()?;
        let (Some(crop), Some(contract_type)) = (self.crop, self.contract_type) else {
            return Err(GrainError::validation("crop", "crop is required"));
        };
        Ok(Contract {
            id,
            crop,
            contract_type,
            bushels: self.bushels,
            futures_price: self.futures_price,
            basis: self.basis,
            futures_month: normalize_text(self.futures_month),
            elevator: self.elevator.trim().to_string(),
            delivery: self.delivery,
            status: self.status.unwrap_or_default(),
            crop_year: self.crop_year,
            notes: normalize_text(self.notes),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct ContractPatch {
    pub crop: Option<Crop>,
    pub contract_type: Option<ContractType>,
    pub bushels: Option<f64>,
    pub futures_price: Option<f64>,
    pub basis: Option<Option<f64>>,
    pub futures_month: Option<Option<String>>,
    pub elevator: Option<String>,
    pub delivery_start: Option<Option<NaiveDate>>,
    pub delivery_end: Option<Option<NaiveDate>>,
    pub status: Option<ContractStatus>,
    pub crop_year: Option<Option<i32>>,
    pub notes: Option<Option<String>>,
}

impl ContractPatch {
    pub fn status(status: ContractStatus) -> Self {
        ContractPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Field-level checks. Cross-field checks run on the merged contract.
    pub fn validate(&self) -> Result<(), GrainError> {
        if let Some(bushels) = self.bushels {
            validate_bushels(bushels)?;
        }
        if let Some(price) = self.futures_price {
            validate_futures_price(price)?;
        }
        if let Some(basis) = self.basis {
            validate_basis(basis)?;
        }
        if let Some(elevator) = &self.elevator {
            validate_elevator(elevator)?;
        }
        if let Some(year) = self.crop_year {
            validate_crop_year(year)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.crop.is_none()
            && self.contract_type.is_none()
            && self.bushels.is_none()
            && self.futures_price.is_none()
            && self.basis.is_none()
            && self.futures_month.is_none()
            && self.elevator.is_none()
            && self.delivery_start.is_none()
            && self.delivery_end.is_none()
            && self.status.is_none()
            && self.crop_year.is_none()
            && self.notes.is_none()
    }
}

/// Listing filter. Fields are ANDed; `None` matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractFilter {
    pub crop: Option<Crop>,
    pub crop_year: Option<i32>,
    pub contract_type: Option<ContractType>,
    pub status: Option<ContractStatus>,
}

impl ContractFilter {
    pub fn open(crop: Crop, crop_year: Option<i32>) -> Self {
        ContractFilter {
            crop: Some(crop),
            crop_year,
            contract_type: None,
            status: Some(ContractStatus::Open),
        }
    }

    pub fn matches(&self, contract: &Contract, default_year: i32) -> bool {
        self.crop.is_none_or(|c| contract.crop == c)
            && self
                .crop_year
                .is_none_or(|y| contract.effective_crop_year(default_year) == y)
            && self
                .contract_type
                .is_none_or(|t| contract.contract_type == t)
            && self.status.is_none_or(|s| contract.status == s)
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_bushels(bushels: f64) -> Result<(), GrainError> {
    if !bushels.is_finite() || bushels <= 0.0 {
        return Err(GrainError::validation(
            "bushels",
            format!("bushels must be positive, got {bushels}"),
        ));
    }
    Ok(())
}

fn validate_futures_price(price: f64) -> Result<(), GrainError> {
    if !price.is_finite() || price < 0.0 {
        return Err(GrainError::validation(
            "futures_price",
            format!("futures price must be zero or positive, got {price}"),
        ));
    }
    Ok(())
}

fn validate_basis(basis: Option<f64>) -> Result<(), GrainError> {
    match basis {
        Some(b) if !b.is_finite() => Err(GrainError::validation(
            "basis",
            "basis must be a finite number of cents",
        )),
        _ => Ok(()),
    }
}

fn validate_elevator(elevator: &str) -> Result<(), GrainError> {
    if elevator.trim().is_empty() {
        return Err(GrainError::validation("elevator", "elevator is required"));
    }
    Ok(())
}

fn validate_crop_year(year: Option<i32>) -> Result<(), GrainError> {
    match year {
        Some(y) if !(MIN_CROP_YEAR..=MAX_CROP_YEAR).contains(&y) => Err(GrainError::validation(
            "crop_year",
            format!("crop year must be between {MIN_CROP_YEAR} and {MAX_CROP_YEAR}, got {y}"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn validate_window(window: DeliveryWindow) -> Result<(), GrainError> {
    if let (Some(start), Some(end)) = (window.start, window.end) {
        if start > end {
            return Err(GrainError::validation(
                "delivery_window",
                format!("delivery start {start} is after end {end}"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn sample_draft() -> ContractDraft {
        ContractDraft {
            crop: Some(Crop::Corn),
            contract_type: Some(ContractType::Hta),
            bushels: 5000.0,
            futures_price: 4.60,
            basis: Some(-35.0),
            futures_month: Some("Dec26".into()),
            elevator: "ADM Winona".into(),
            ..Default::default()
        }
    }

    fn sample_contract() -> Contract {
        sample_draft().into_contract("c-1".into(), now()).unwrap()
    }

    #[test]
    fn cash_price_divides_basis_once() {
        let contract = sample_contract();
        assert_relative_eq!(contract.cash_price(), 4.25, epsilon = 1e-12);
    }

    #[test]
    fn cash_price_without_basis_is_futures() {
        let mut contract = sample_contract();
        contract.basis = None;
        assert_eq!(contract.cash_price(), 4.60);
    }

    #[test]
    fn year_from_month_label() {
        assert_eq!(year_from_futures_month("Dec26"), Some(2026));
        assert_eq!(year_from_futures_month("Mar27 "), Some(2027));
        assert_eq!(year_from_futures_month("Dec"), None);
        assert_eq!(year_from_futures_month("6"), None);
        assert_eq!(year_from_futures_month(""), None);
    }

    #[test]
    fn derive_crop_year_falls_back_to_default() {
        assert_eq!(derive_crop_year(Some("Nov25"), 2026), 2025);
        assert_eq!(derive_crop_year(None, 2026), 2026);
        assert_eq!(derive_crop_year(Some("spot"), 2024), 2024);
    }

    #[test]
    fn explicit_crop_year_wins() {
        let mut contract = sample_contract();
        assert_eq!(contract.effective_crop_year(2030), 2026);
        contract.crop_year = Some(2027);
        assert_eq!(contract.effective_crop_year(2030), 2027);
    }

    #[test]
    fn crop_year_conflict_detected() {
        let mut contract = sample_contract();
        assert_eq!(contract.crop_year_conflict(), None);
        contract.crop_year = Some(2026);
        assert_eq!(contract.crop_year_conflict(), None);
        contract.crop_year = Some(2025);
        assert_eq!(
            contract.crop_year_conflict(),
            Some(CropYearConflict {
                explicit: 2025,
                derived: 2026
            })
        );
    }

    #[test]
    fn draft_rejects_non_positive_bushels() {
        let mut draft = sample_draft();
        draft.bushels = 0.0;
        assert!(matches!(draft.validate(), Err(GrainError::Validation { field, .. }) if field == "bushels"));
        draft.bushels = -10.0;
        assert!(draft.validate().is_err());
    }

    #[test]
    fn draft_requires_crop_and_elevator() {
        let mut draft = sample_draft();
        draft.crop = None;
        assert!(matches!(draft.validate(), Err(GrainError::Validation { field, .. }) if field == "crop"));

        let mut draft = sample_draft();
        draft.elevator = "   ".into();
        assert!(matches!(draft.validate(), Err(GrainError::Validation { field, .. }) if field == "elevator"));
    }

    #[test]
    fn draft_rejects_inverted_delivery_window() {
        let mut draft = sample_draft();
        draft.delivery = DeliveryWindow {
            start: NaiveDate::from_ymd_opt(2026, 11, 1),
            end: NaiveDate::from_ymd_opt(2026, 10, 1),
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn into_contract_defaults_status_to_open() {
        let contract = sample_contract();
        assert_eq!(contract.status, ContractStatus::Open);
        assert_eq!(contract.created_at, contract.updated_at);
    }

    #[test]
    fn apply_patch_merges_and_clears() {
        let mut contract = sample_contract();
        let later = now() + chrono::Duration::hours(1);
        contract.apply(
            ContractPatch {
                bushels: Some(7500.0),
                basis: Some(None),
                ..Default::default()
            },
            later,
        );
        assert_eq!(contract.bushels, 7500.0);
        assert_eq!(contract.basis, None);
        assert_eq!(contract.futures_price, 4.60);
        assert_eq!(contract.updated_at, later);
        assert_eq!(contract.created_at, now());
    }

    #[test]
    fn filter_fields_are_anded() {
        let contract = sample_contract();
        let by_crop = ContractFilter {
            crop: Some(Crop::Corn),
            ..Default::default()
        };
        assert!(by_crop.matches(&contract, 2026));

        let corn_delivered = ContractFilter {
            crop: Some(Crop::Corn),
            status: Some(ContractStatus::Delivered),
            ..Default::default()
        };
        assert!(!corn_delivered.matches(&contract, 2026));

        let by_year = ContractFilter {
            crop_year: Some(2027),
            ..Default::default()
        };
        assert!(!by_year.matches(&contract, 2027));
        assert!(ContractFilter::default().matches(&contract, 2026));
    }

    #[test]
    fn delivers_in_uses_window_end() {
        let mut contract = sample_contract();
        assert!(!contract.delivers_in(2026, 10));
        contract.delivery.end = NaiveDate::from_ymd_opt(2026, 10, 31);
        assert!(contract.delivers_in(2026, 10));
        assert!(!contract.delivers_in(2026, 11));
    }
}
