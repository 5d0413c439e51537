//! Market snapshot persistence port trait.

use crate::domain::crop::Crop;
use crate::domain::error::GrainError;
use crate::domain::snapshot::MarketSnapshot;

/// Append-only snapshot storage.
pub trait SnapshotPort {
    fn append_snapshot(&self, snapshot: &MarketSnapshot) -> Result<(), GrainError>;

    /// Every snapshot for `crop`, in insertion order.
    fn snapshots_for(&self, crop: Crop) -> Result<Vec<MarketSnapshot>, GrainError>;
}
