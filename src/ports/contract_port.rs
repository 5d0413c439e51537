//! Contract persistence port trait.

use crate::domain::contract::Contract;
use crate::domain::error::GrainError;

/// Keyed contract storage. Filtering and crop-year derivation live in the
/// domain, so the store only needs to round-trip whole records.
pub trait ContractPort {
    fn insert_contract(&self, contract: &Contract) -> Result<(), GrainError>;

    fn get_contract(&self, id: &str) -> Result<Option<Contract>, GrainError>;

    /// Replace the stored record with the same id. Returns `false` when no
    /// such record exists.
    fn replace_contract(&self, contract: &Contract) -> Result<bool, GrainError>;

    /// Returns `false` when no such record exists.
    fn delete_contract(&self, id: &str) -> Result<bool, GrainError>;

    /// Every contract, in insertion order.
    fn list_contracts(&self) -> Result<Vec<Contract>, GrainError>;
}
