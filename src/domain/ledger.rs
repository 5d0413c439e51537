//! Contract ledger: validated mutations and filtered queries over a
//! [`ContractPort`].

use tracing::{info, warn};
use uuid::Uuid;

use super::contract::{validate_window, Contract, ContractDraft, ContractFilter, ContractPatch};
use super::crop::ContractStatus;
use super::error::GrainError;
use crate::ports::clock_port::ClockPort;
use crate::ports::contract_port::ContractPort;

const ENTITY: &str = "contract";

pub struct ContractLedger<'a> {
    store: &'a dyn ContractPort,
    clock: &'a dyn ClockPort,
    default_crop_year: i32,
}

impl<'a> ContractLedger<'a> {
    pub fn new(store: &'a dyn ContractPort, clock: &'a dyn ClockPort, default_crop_year: i32) -> Self {
        Self {
            store,
            clock,
            default_crop_year,
        }
    }

    pub fn default_crop_year(&self) -> i32 {
        self.default_crop_year
    }

    pub fn create(&self, draft: ContractDraft) -> Result<Contract, GrainError> {
        let contract = draft.into_contract(Uuid::new_v4().to_string(), self.clock.now())?;
        self.store.insert_contract(&contract)?;
        info!(id = %contract.id, crop = %contract.crop, bushels = contract.bushels, "contract created");
        self.warn_on_conflict(&contract);
        Ok(contract)
    }

    pub fn get(&self, id: &str) -> Result<Contract, GrainError> {
        self.store
            .get_contract(id)?
            .ok_or_else(|| GrainError::not_found(ENTITY, id))
    }

    /// Merge `patch` into the stored contract. `updated_at` is always
    /// refreshed; `id` and `created_at` never change.
    pub fn update(&self, id: &str, patch: ContractPatch) -> Result<Contract, GrainError> {
        patch.validate()?;
        let mut contract = self.get(id)?;
        contract.apply(patch, self.clock.now());
        validate_window(contract.delivery)?;
        if !self.store.replace_contract(&contract)? {
            return Err(GrainError::not_found(ENTITY, id));
        }
        info!(id = %contract.id, status = %contract.status, "contract updated");
        self.warn_on_conflict(&contract);
        Ok(contract)
    }

    /// Set status to delivered. Calling it on a delivered contract returns
    /// the stored record untouched.
    pub fn mark_delivered(&self, id: &str) -> Result<Contract, GrainError> {
        let contract = self.get(id)?;
        if contract.status == ContractStatus::Delivered {
            return Ok(contract);
        }
        self.update(id, ContractPatch::status(ContractStatus::Delivered))
    }

    pub fn delete(&self, id: &str) -> Result<(), GrainError> {
        if !self.store.delete_contract(id)? {
            return Err(GrainError::not_found(ENTITY, id));
        }
        info!(id, "contract deleted");
        Ok(())
    }

    /// Contracts matching every set field of `filter`, in insertion order.
    pub fn list(&self, filter: &ContractFilter) -> Result<Vec<Contract>, GrainError> {
        Ok(self
            .store
            .list_contracts()?
            .into_iter()
            .filter(|c| filter.matches(c, self.default_crop_year))
            .collect())
    }

    pub fn list_all(&self) -> Result<Vec<Contract>, GrainError> {
        self.store.list_contracts()
    }

    /// Contracts whose stored crop year disagrees with their futures month.
    pub fn crop_year_conflicts(&self) -> Result<Vec<Contract>, GrainError> {
        Ok(self
            .store
            .list_contracts()?
            .into_iter()
            .filter(|c| c.crop_year_conflict().is_some())
            .collect())
    }

    /// Contracts whose delivery window ends in the given month, any status.
    pub fn deliveries_in(&self, year: i32, month: u32) -> Result<Vec<Contract>, GrainError> {
        Ok(self
            .store
            .list_contracts()?
            .into_iter()
            .filter(|c| c.delivers_in(year, month))
            .collect())
    }

    fn warn_on_conflict(&self, contract: &Contract) {
        if let Some(conflict) = contract.crop_year_conflict() {
            warn!(
                id = %contract.id,
                explicit = conflict.explicit,
                derived = conflict.derived,
                "crop year disagrees with futures month"
            );
        }
    }
}
