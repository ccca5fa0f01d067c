//! Abstract storage traits for the council election engine.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The engine reads through the per-concern traits and writes only
//! through [`GovernanceStore::commit`], which applies a whole [`ChangeSet`]
//! atomically.
//!
//! Records are keyed so that a field, once written, stays addressable by the
//! same key forever; nothing is ever migrated in place.

pub mod ballot;
pub mod change_set;
pub mod election;
pub mod error;
pub mod relay;
pub mod snapshot;

pub use ballot::{BallotRecord, BallotStore, CastVoteRecord};
pub use change_set::{Change, ChangeSet};
pub use election::{CouncilState, ElectionRecord, ElectionStore, Tally};
pub use error::StoreError;
pub use relay::{ConsumedMessage, GuardianSet, OutboundRecord, RelayStore};
pub use snapshot::SnapshotStore;

/// Everything the governance engine needs from persistence.
pub trait GovernanceStore: ElectionStore + SnapshotStore + BallotStore + RelayStore {
    /// Apply every change in `changes`, or none of them.
    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}
