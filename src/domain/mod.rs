//! Core domain types and logic.

pub mod alert;
pub mod config_validation;
pub mod contract;
pub mod crop;
pub mod elevator;
pub mod error;
pub mod exposure;
pub mod ledger;
pub mod marketing_plan;
pub mod pricing;
pub mod settings;
pub mod snapshot;
