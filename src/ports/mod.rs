//! Port traits at the storage, configuration and time seams.

pub mod alert_port;
pub mod clock_port;
pub mod config_port;
pub mod contract_port;
pub mod snapshot_port;

use alert_port::AlertPort;
use contract_port::ContractPort;
use snapshot_port::SnapshotPort;

/// A single logical store backing every capability group.
pub trait StoragePort: ContractPort + SnapshotPort + AlertPort {}

impl<T: ContractPort + SnapshotPort + AlertPort> StoragePort for T {}
