//! The snapshot provider capability.
//!
//! Providers are external balance oracles. The engine trusts their answers
//! and never retries: a failed call fails the invoking operation.

use council_types::{Address, SnapshotId};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("checkpoint {0} not found")]
    CheckpointNotFound(SnapshotId),

    #[error("provider call failed: {0}")]
    CallFailed(String),
}

/// A balance source with checkpointed history.
pub trait SnapshotProvider: Send + Sync {
    /// Freeze current balances and return the checkpoint handle.
    fn take_checkpoint(&self) -> Result<SnapshotId, ProviderError>;

    /// Balance of `account` as of `checkpoint`. Must be stable forever.
    fn balance_at(&self, checkpoint: SnapshotId, account: &Address) -> Result<u128, ProviderError>;
}

/// Maps provider addresses to callable providers.
///
/// An address that does not resolve is "not a contract".
pub trait ProviderDirectory {
    fn resolve(&self, provider: &Address) -> Option<Arc<dyn SnapshotProvider>>;
}

impl<D: ProviderDirectory + ?Sized> ProviderDirectory for Arc<D> {
    fn resolve(&self, provider: &Address) -> Option<Arc<dyn SnapshotProvider>> {
        (**self).resolve(provider)
    }
}
