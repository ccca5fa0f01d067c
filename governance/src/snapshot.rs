//! Vote power snapshotter: freezes one checkpoint per provider per election.

use crate::clock::Clock;
use crate::engine::{require_period, GovernanceEngine};
use crate::error::GovernanceError;
use crate::provider::{ProviderDirectory, ProviderError};
use council_store::{ChangeSet, GovernanceStore};
use council_types::{Address, ElectionId, EpochPeriod, SnapshotId};

pub(crate) fn provider_failure(err: ProviderError) -> GovernanceError {
    match err {
        ProviderError::CheckpointNotFound(_) => GovernanceError::InvalidSnapshotContract,
        ProviderError::CallFailed(msg) => GovernanceError::Provider(msg),
    }
}

impl<S, C, D> GovernanceEngine<S, C, D>
where
    S: GovernanceStore,
    C: Clock,
    D: ProviderDirectory,
{
    /// Freeze `provider`'s balances for the election in progress.
    ///
    /// Nomination period only, once per provider per election.
    pub fn take_vote_power_snapshot(&self, provider: &Address) -> Result<SnapshotId, GovernanceError> {
        let now = self.now();
        let (council, record) = self.current()?;
        require_period(&record, EpochPeriod::Nomination, now)?;

        let election = council.current_election;
        if !self.store().provider_enabled(provider)? {
            return Err(GovernanceError::InvalidSnapshotContract);
        }
        if self.store().snapshot_id(election, provider)?.is_taken() {
            return Err(GovernanceError::SnapshotAlreadyTaken);
        }
        let source = self
            .directory()
            .resolve(provider)
            .ok_or(GovernanceError::InvalidSnapshotContract)?;

        let id = source.take_checkpoint().map_err(provider_failure)?;
        if !id.is_taken() {
            tracing::warn!(%provider, "provider returned an empty checkpoint id");
            return Err(GovernanceError::InvalidSnapshotContract);
        }

        let mut changes = ChangeSet::new();
        changes.put_snapshot_id(election, *provider, id);
        self.commit(changes)?;
        self.bump("snapshots_taken");

        tracing::info!(%election, %provider, snapshot = %id, "vote power snapshot taken");
        Ok(id)
    }

    /// The checkpoint frozen for `(election, provider)`; zero when none.
    pub fn get_vote_power_snapshot_id(
        &self,
        provider: &Address,
        election: ElectionId,
    ) -> Result<SnapshotId, GovernanceError> {
        Ok(self.store().snapshot_id(election, provider)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_checkpoint_reads_as_invalid_contract() {
        assert!(matches!(
            provider_failure(ProviderError::CheckpointNotFound(SnapshotId(3))),
            GovernanceError::InvalidSnapshotContract
        ));
        assert!(matches!(
            provider_failure(ProviderError::CallFailed("down".into())),
            GovernanceError::Provider(m) if m == "down"
        ));
    }
}
