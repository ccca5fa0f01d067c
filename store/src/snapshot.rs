//! Snapshot provider registry and frozen vote-power snapshot ids.

use crate::StoreError;
use council_types::{Address, ElectionId, SnapshotId};

/// Trait for snapshot provider registrations and per-election snapshot ids.
pub trait SnapshotStore {
    /// Whether a provider is currently enabled. Unknown providers are disabled.
    fn provider_enabled(&self, provider: &Address) -> Result<bool, StoreError>;

    /// All providers whose enabled bit is set.
    fn enabled_providers(&self) -> Result<Vec<Address>, StoreError>;

    /// The snapshot id frozen for `(election, provider)`, or [`SnapshotId::NONE`].
    fn snapshot_id(
        &self,
        election: ElectionId,
        provider: &Address,
    ) -> Result<SnapshotId, StoreError>;
}
