//! CSV import of market snapshots and export of contracts.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::contract::Contract;
use crate::domain::crop::Crop;
use crate::domain::error::GrainError;
use crate::domain::snapshot::SnapshotEntry;

/// `crop,futures_month,futures_price,cash_price[,basis][,implied_vol]`.
/// A blank basis is derived from the two prices when recorded.
#[derive(Debug, Deserialize)]
struct SnapshotRow {
    crop: String,
    futures_month: String,
    futures_price: f64,
    cash_price: f64,
    #[serde(default)]
    basis: Option<f64>,
    #[serde(default)]
    implied_vol: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ContractRow<'a> {
    id: &'a str,
    crop: &'static str,
    contract_type: &'static str,
    crop_year: i32,
    futures_month: Option<&'a str>,
    bushels: f64,
    futures_price: f64,
    basis: Option<f64>,
    cash_price: f64,
    elevator: &'a str,
    delivery_start: Option<String>,
    delivery_end: Option<String>,
    status: &'static str,
    notes: Option<&'a str>,
}

fn import_error(line: Option<u64>, reason: impl std::fmt::Display) -> GrainError {
    let reason = match line {
        Some(line) => format!("line {line}: {reason}"),
        None => reason.to_string(),
    };
    GrainError::Import { reason }
}

/// Parse snapshot rows. Any bad row fails the whole import; the error names
/// the line the record starts on.
pub fn read_snapshot_entries<R: Read>(reader: R) -> Result<Vec<SnapshotEntry>, GrainError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| import_error(e.position().map(|p| p.line()), format!("CSV parse error: {e}")))?
        .clone();
    let mut entries = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| {
            import_error(e.position().map(|p| p.line()), format!("CSV parse error: {e}"))
        })?;
        let line = record.position().map(|p| p.line());
        let row: SnapshotRow = record
            .deserialize(Some(&headers))
            .map_err(|e| import_error(line, format!("CSV parse error: {e}")))?;
        let crop: Crop = row.crop.parse().map_err(|e| import_error(line, e))?;
        let entry = SnapshotEntry {
            crop,
            futures_month: row.futures_month,
            futures_price: row.futures_price,
            cash_price: row.cash_price,
            basis_cents: row.basis,
            implied_vol: row.implied_vol,
        };
        entry.validate().map_err(|e| import_error(line, e))?;
        entries.push(entry);
    }

    Ok(entries)
}

pub fn read_snapshot_file<P: AsRef<Path>>(path: P) -> Result<Vec<SnapshotEntry>, GrainError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| GrainError::Import {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    read_snapshot_entries(file)
}

/// Write contracts with their resolved crop year and cash price.
pub fn write_contracts<W: Write>(
    writer: W,
    contracts: &[Contract],
    default_crop_year: i32,
) -> Result<(), GrainError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for c in contracts {
        wtr.serialize(ContractRow {
            id: &c.id,
            crop: c.crop.as_str(),
            contract_type: c.contract_type.as_str(),
            crop_year: c.effective_crop_year(default_crop_year),
            futures_month: c.futures_month.as_deref(),
            bushels: c.bushels,
            futures_price: c.futures_price,
            basis: c.basis,
            cash_price: c.cash_price(),
            elevator: &c.elevator,
            delivery_start: c.delivery.start.map(|d| d.format("%Y-%m-%d").to_string()),
            delivery_end: c.delivery.end.map(|d| d.format("%Y-%m-%d").to_string()),
            status: c.status.as_str(),
            notes: c.notes.as_deref(),
        })
        .map_err(|e| GrainError::Import {
            reason: format!("CSV write error: {e}"),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_contract_file<P: AsRef<Path>>(
    path: P,
    contracts: &[Contract],
    default_crop_year: i32,
) -> Result<(), GrainError> {
    let file = File::create(path)?;
    write_contracts(file, contracts, default_crop_year)
}
