//! Concrete adapter implementations for ports.

pub mod clock_adapter;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod memory_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
