//! Nullable snapshot providers: scriptable balance oracles.

use council_governance::{ProviderDirectory, ProviderError, SnapshotProvider};
use council_types::{Address, SnapshotId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct ProviderState {
    balances: BTreeMap<Address, u128>,
    checkpoints: BTreeMap<SnapshotId, BTreeMap<Address, u128>>,
    last_id: u128,
    failing: bool,
    empty_checkpoints: bool,
}

/// An in-memory token that freezes its balances on every checkpoint.
///
/// Checkpoint ids start at 1 and increase by one per call.
#[derive(Default)]
pub struct NullSnapshotProvider {
    state: Mutex<ProviderState>,
}

impl NullSnapshotProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProviderState>, ProviderError> {
        self.state
            .lock()
            .map_err(|_| ProviderError::CallFailed("provider state poisoned".into()))
    }

    /// Set a live balance; affects checkpoints taken afterwards.
    pub fn set_balance(&self, account: Address, amount: u128) {
        if let Ok(mut s) = self.lock() {
            s.balances.insert(account, amount);
        }
    }

    /// Overwrite a balance inside an existing (or future) checkpoint.
    pub fn set_balance_at(&self, checkpoint: SnapshotId, account: Address, amount: u128) {
        if let Ok(mut s) = self.lock() {
            s.checkpoints
                .entry(checkpoint)
                .or_default()
                .insert(account, amount);
        }
    }

    /// Make every call fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut s) = self.lock() {
            s.failing = failing;
        }
    }

    /// Make `take_checkpoint` return id 0.
    pub fn set_empty_checkpoints(&self, empty: bool) {
        if let Ok(mut s) = self.lock() {
            s.empty_checkpoints = empty;
        }
    }

    pub fn checkpoints_taken(&self) -> u128 {
        self.lock().map(|s| s.last_id).unwrap_or(0)
    }
}

impl SnapshotProvider for NullSnapshotProvider {
    fn take_checkpoint(&self) -> Result<SnapshotId, ProviderError> {
        let mut s = self.lock()?;
        if s.failing {
            return Err(ProviderError::CallFailed("checkpoint refused".into()));
        }
        if s.empty_checkpoints {
            return Ok(SnapshotId::NONE);
        }
        s.last_id += 1;
        let id = SnapshotId(s.last_id);
        let frozen = s.balances.clone();
        s.checkpoints.entry(id).or_default().extend(frozen);
        Ok(id)
    }

    fn balance_at(&self, checkpoint: SnapshotId, account: &Address) -> Result<u128, ProviderError> {
        let s = self.lock()?;
        if s.failing {
            return Err(ProviderError::CallFailed("balance query refused".into()));
        }
        let frozen = s
            .checkpoints
            .get(&checkpoint)
            .ok_or(ProviderError::CheckpointNotFound(checkpoint))?;
        Ok(frozen.get(account).copied().unwrap_or(0))
    }
}

/// Address book of nullable providers.
#[derive(Default)]
pub struct NullProviderDirectory {
    providers: Mutex<BTreeMap<Address, Arc<dyn SnapshotProvider>>>,
}

impl NullProviderDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, address: Address, provider: Arc<dyn SnapshotProvider>) {
        if let Ok(mut map) = self.providers.lock() {
            map.insert(address, provider);
        }
    }

    /// Register a fresh [`NullSnapshotProvider`] and return a handle to it.
    pub fn register_null(&self, address: Address) -> Arc<NullSnapshotProvider> {
        let provider = Arc::new(NullSnapshotProvider::new());
        self.register(address, provider.clone());
        provider
    }

    pub fn unregister(&self, address: &Address) {
        if let Ok(mut map) = self.providers.lock() {
            map.remove(address);
        }
    }
}

impl ProviderDirectory for NullProviderDirectory {
    fn resolve(&self, provider: &Address) -> Option<Arc<dyn SnapshotProvider>> {
        self.providers.lock().ok()?.get(provider).cloned()
    }
}
