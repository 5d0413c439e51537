#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use grainledger::adapters::clock_adapter::FixedClock;
use grainledger::adapters::memory_adapter::MemoryAdapter;
use grainledger::domain::contract::{Contract, ContractDraft, DeliveryWindow};
use grainledger::domain::crop::{ContractType, Crop};
use grainledger::domain::ledger::ContractLedger;
use grainledger::domain::snapshot::{MarketSnapshot, SnapshotEntry, SnapshotStore};
use std::io::Write;

pub const DEFAULT_YEAR: i32 = 2026;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 14, 0, 0).unwrap()
}

pub fn clock() -> FixedClock {
    FixedClock::new(t0())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn draft(crop: Crop, bushels: f64, futures_price: f64) -> ContractDraft {
    ContractDraft {
        crop: Some(crop),
        contract_type: Some(ContractType::Cash),
        bushels,
        futures_price,
        basis: None,
        futures_month: None,
        elevator: "ADM".to_string(),
        delivery: DeliveryWindow::default(),
        status: None,
        crop_year: None,
        notes: None,
    }
}

pub fn draft_with(
    crop: Crop,
    bushels: f64,
    futures_price: f64,
    basis: Option<f64>,
    futures_month: &str,
) -> ContractDraft {
    ContractDraft {
        basis,
        futures_month: Some(futures_month.to_string()),
        ..draft(crop, bushels, futures_price)
    }
}

pub fn add(ledger: &ContractLedger<'_>, d: ContractDraft) -> Contract {
    ledger.create(d).unwrap()
}

pub fn entry(crop: Crop, futures_price: f64, cash_price: f64) -> SnapshotEntry {
    SnapshotEntry {
        crop,
        futures_month: match crop {
            Crop::Corn => "Dec26".to_string(),
            Crop::Soybeans => "Nov26".to_string(),
        },
        futures_price,
        cash_price,
        basis_cents: None,
        implied_vol: None,
    }
}

/// Record a snapshot `ago` before the clock's current time, then restore it.
pub fn record_ago(
    store: &MemoryAdapter,
    clock: &FixedClock,
    ago: Duration,
    e: SnapshotEntry,
) -> MarketSnapshot {
    use grainledger::ports::clock_port::ClockPort;
    let now = clock.now();
    clock.set(now - ago);
    let snap = SnapshotStore::new(store, clock).record(e).unwrap();
    clock.set(now);
    snap
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const FARM_INI: &str = r#"
[marketing]
default_crop_year = 2026
ahead_pct = 60
on_track_pct = 30
rank_size = 2

[production]
corn = 50000
soybeans = 15000

[cost]
corn = 4.20
soybeans = 10.50

[elevator.adm]
name = ADM
corn_basis = -30
soybeans_basis = -40

[elevator.dummer]
name = Dummer
corn_basis = -35
haul_cost = 0.02
"#;
