//! Snapshot providers backed by balance history files.
//!
//! A history file is a JSON object mapping each account to a list of
//! `[since_unix_secs, balance]` entries. A checkpoint is the unix time it was
//! taken at, and the balance at a checkpoint is the latest entry at or before
//! it. Files are expected to be append-only so answers never change.

use council_governance::{Clock, ProviderDirectory, ProviderError, SnapshotProvider};
use council_types::{Address, SnapshotId, Timestamp};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::NodeError;

pub struct BalanceHistoryProvider<C> {
    history: BTreeMap<Address, Vec<(u64, u128)>>,
    clock: C,
}

impl<C: Clock> BalanceHistoryProvider<C> {
    pub fn new(mut history: BTreeMap<Address, Vec<(u64, u128)>>, clock: C) -> Self {
        for entries in history.values_mut() {
            entries.sort_by_key(|(since, _)| *since);
        }
        Self { history, clock }
    }

    pub fn from_json(json: &str, clock: C) -> Result<Self, NodeError> {
        let history = serde_json::from_str(json).map_err(|e| NodeError::History(e.to_string()))?;
        Ok(Self::new(history, clock))
    }

    pub fn from_file(path: &Path, clock: C) -> Result<Self, NodeError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| NodeError::History(format!("{}: {e}", path.display())))?;
        Self::from_json(&json, clock)
    }

    pub fn accounts(&self) -> usize {
        self.history.len()
    }
}

impl<C: Clock + Send + Sync> SnapshotProvider for BalanceHistoryProvider<C> {
    fn take_checkpoint(&self) -> Result<SnapshotId, ProviderError> {
        Ok(SnapshotId(self.clock.now().as_secs() as u128))
    }

    fn balance_at(&self, checkpoint: SnapshotId, account: &Address) -> Result<u128, ProviderError> {
        let now = self.clock.now();
        if !checkpoint.is_taken() || checkpoint.0 > now.as_secs() as u128 {
            return Err(ProviderError::CheckpointNotFound(checkpoint));
        }
        let at = checkpoint.0 as u64;
        Ok(self
            .history
            .get(account)
            .and_then(|entries| entries.iter().rev().find(|(since, _)| *since <= at))
            .map(|(_, balance)| *balance)
            .unwrap_or(0))
    }
}

/// Providers configured for this node, by address.
#[derive(Default)]
pub struct ConfiguredProviders {
    providers: BTreeMap<Address, Arc<dyn SnapshotProvider>>,
}

impl ConfiguredProviders {
    /// Load every configured history file, resolving relative paths against
    /// `base`.
    pub fn load<C>(configs: &[ProviderConfig], base: &Path, clock: C) -> Result<Self, NodeError>
    where
        C: Clock + Clone + Send + Sync + 'static,
    {
        let mut providers: BTreeMap<Address, Arc<dyn SnapshotProvider>> = BTreeMap::new();
        for config in configs {
            let path = base.join(&config.history_file);
            let provider = BalanceHistoryProvider::from_file(&path, clock.clone())?;
            tracing::info!(
                provider = %config.address,
                accounts = provider.accounts(),
                file = %path.display(),
                "loaded balance history"
            );
            providers.insert(config.address, Arc::new(provider));
        }
        Ok(Self { providers })
    }

    pub fn insert(&mut self, address: Address, provider: Arc<dyn SnapshotProvider>) {
        self.providers.insert(address, provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ProviderDirectory for ConfiguredProviders {
    fn resolve(&self, provider: &Address) -> Option<Arc<dyn SnapshotProvider>> {
        self.providers.get(provider).cloned()
    }
}

/// Checkpoint id for a point in time, as issued by [`BalanceHistoryProvider`].
pub fn checkpoint_at(time: Timestamp) -> SnapshotId {
    SnapshotId(time.as_secs() as u128)
}
