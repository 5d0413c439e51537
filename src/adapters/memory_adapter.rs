//! In-memory store for contracts, snapshots and alerts.
//!
//! Backs the test suite and `--memory` runs. Records are kept in insertion
//! order so listing matches the SQLite adapter's rowid ordering.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::alert::Alert;
use crate::domain::contract::Contract;
use crate::domain::crop::Crop;
use crate::domain::error::GrainError;
use crate::domain::snapshot::MarketSnapshot;
use crate::ports::alert_port::AlertPort;
use crate::ports::contract_port::ContractPort;
use crate::ports::snapshot_port::SnapshotPort;

#[derive(Debug, Default)]
pub struct MemoryAdapter {
    contracts: RwLock<Vec<Contract>>,
    snapshots: RwLock<Vec<MarketSnapshot>>,
    alerts: RwLock<Vec<Alert>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, GrainError> {
    lock.read().map_err(|e| GrainError::Database {
        reason: format!("store lock poisoned: {e}"),
    })
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, GrainError> {
    lock.write().map_err(|e| GrainError::Database {
        reason: format!("store lock poisoned: {e}"),
    })
}

fn duplicate(entity: &str, id: &str) -> GrainError {
    GrainError::DatabaseQuery {
        reason: format!("{entity} '{id}' already exists"),
    }
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContractPort for MemoryAdapter {
    fn insert_contract(&self, contract: &Contract) -> Result<(), GrainError> {
        let mut contracts = write(&self.contracts)?;
        if contracts.iter().any(|c| c.id == contract.id) {
            return Err(duplicate("contract", &contract.id));
        }
        contracts.push(contract.clone());
        Ok(())
    }

    fn get_contract(&self, id: &str) -> Result<Option<Contract>, GrainError> {
        Ok(read(&self.contracts)?.iter().find(|c| c.id == id).cloned())
    }

    fn replace_contract(&self, contract: &Contract) -> Result<bool, GrainError> {
        let mut contracts = write(&self.contracts)?;
        match contracts.iter_mut().find(|c| c.id == contract.id) {
            Some(slot) => {
                *slot = contract.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_contract(&self, id: &str) -> Result<bool, GrainError> {
        let mut contracts = write(&self.contracts)?;
        let before = contracts.len();
        contracts.retain(|c| c.id != id);
        Ok(contracts.len() != before)
    }

    fn list_contracts(&self) -> Result<Vec<Contract>, GrainError> {
        Ok(read(&self.contracts)?.clone())
    }
}

impl SnapshotPort for MemoryAdapter {
    fn append_snapshot(&self, snapshot: &MarketSnapshot) -> Result<(), GrainError> {
        let mut snapshots = write(&self.snapshots)?;
        if snapshots.iter().any(|s| s.id == snapshot.id) {
            return Err(duplicate("snapshot", &snapshot.id));
        }
        snapshots.push(snapshot.clone());
        Ok(())
    }

    fn snapshots_for(&self, crop: Crop) -> Result<Vec<MarketSnapshot>, GrainError> {
        Ok(read(&self.snapshots)?
            .iter()
            .filter(|s| s.crop == crop)
            .cloned()
            .collect())
    }
}

impl AlertPort for MemoryAdapter {
    fn insert_alert(&self, alert: &Alert) -> Result<(), GrainError> {
        let mut alerts = write(&self.alerts)?;
        if alerts.iter().any(|a| a.id == alert.id) {
            return Err(duplicate("alert", &alert.id));
        }
        alerts.push(alert.clone());
        Ok(())
    }

    fn get_alert(&self, id: &str) -> Result<Option<Alert>, GrainError> {
        Ok(read(&self.alerts)?.iter().find(|a| a.id == id).cloned())
    }

    fn replace_alert(&self, alert: &Alert) -> Result<bool, GrainError> {
        let mut alerts = write(&self.alerts)?;
        match alerts.iter_mut().find(|a| a.id == alert.id) {
            Some(slot) => {
                *slot = alert.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_alert(&self, id: &str) -> Result<bool, GrainError> {
        let mut alerts = write(&self.alerts)?;
        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        Ok(alerts.len() != before)
    }

    fn list_alerts(&self) -> Result<Vec<Alert>, GrainError> {
        Ok(read(&self.alerts)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{Contract, DeliveryWindow};
    use crate::domain::crop::{ContractStatus, ContractType};
    use chrono::{TimeZone, Utc};

    fn contract(id: &str) -> Contract {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        Contract {
            id: id.into(),
            crop: Crop::Corn,
            contract_type: ContractType::Cash,
            bushels: 5000.0,
            futures_price: 4.50,
            basis: Some(-30.0),
            futures_month: Some("Dec26".into()),
            elevator: "ADM".into(),
            delivery: DeliveryWindow::default(),
            status: ContractStatus::Open,
            crop_year: None,
            notes: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn snapshot(id: &str, crop: Crop) -> MarketSnapshot {
        MarketSnapshot {
            id: id.into(),
            crop,
            futures_month: "Dec26".into(),
            futures_price: 4.60,
            cash_price: 4.25,
            basis: -35.0,
            implied_vol: None,
            snapshot_at: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn contracts_keep_insertion_order() {
        let store = MemoryAdapter::new();
        for id in ["c", "a", "b"] {
            store.insert_contract(&contract(id)).unwrap();
        }
        let ids: Vec<String> = store.list_contracts().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn duplicate_contract_id_is_rejected() {
        let store = MemoryAdapter::new();
        store.insert_contract(&contract("a")).unwrap();
        assert!(store.insert_contract(&contract("a")).is_err());
    }

    #[test]
    fn replace_and_delete_report_presence() {
        let store = MemoryAdapter::new();
        store.insert_contract(&contract("a")).unwrap();

        let mut changed = contract("a");
        changed.bushels = 7500.0;
        assert!(store.replace_contract(&changed).unwrap());
        assert!(!store.replace_contract(&contract("missing")).unwrap());
        assert_eq!(store.get_contract("a").unwrap().unwrap().bushels, 7500.0);

        assert!(store.delete_contract("a").unwrap());
        assert!(!store.delete_contract("a").unwrap());
        assert!(store.get_contract("a").unwrap().is_none());
    }

    #[test]
    fn snapshots_filter_by_crop() {
        let store = MemoryAdapter::new();
        store.append_snapshot(&snapshot("1", Crop::Corn)).unwrap();
        store.append_snapshot(&snapshot("2", Crop::Soybeans)).unwrap();
        store.append_snapshot(&snapshot("3", Crop::Corn)).unwrap();

        let corn: Vec<String> = store
            .snapshots_for(Crop::Corn)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(corn, vec!["1", "3"]);
        assert_eq!(store.snapshots_for(Crop::Soybeans).unwrap().len(), 1);
    }
}
