//! Ballot manager: turns frozen balances into per-precinct vote power.

use crate::clock::Clock;
use crate::engine::{require_nonzero, require_period, GovernanceEngine};
use crate::error::GovernanceError;
use crate::provider::ProviderDirectory;
use crate::snapshot::provider_failure;
use council_store::{ChangeSet, GovernanceStore};
use council_types::{Address, ChainId, ElectionId, EpochPeriod};

impl<S, C, D> GovernanceEngine<S, C, D>
where
    S: GovernanceStore,
    C: Clock,
    D: ProviderDirectory,
{
    /// Record `voter`'s balance at `provider`'s frozen checkpoint as vote
    /// power in the local precinct. Returns the provider's contribution.
    ///
    /// Calling again with the same provider overwrites the same slot, so the
    /// result is the same however many times it runs.
    pub fn prepare_ballot_with_snapshot(
        &self,
        provider: &Address,
        voter: &Address,
    ) -> Result<u128, GovernanceError> {
        let now = self.now();
        let (council, record) = self.current()?;
        require_period(&record, EpochPeriod::Voting, now)?;
        require_nonzero(voter)?;

        let election = council.current_election;
        if !self.store().provider_enabled(provider)? {
            return Err(GovernanceError::InvalidSnapshotContract);
        }
        let snapshot = self.store().snapshot_id(election, provider)?;
        if !snapshot.is_taken() {
            return Err(GovernanceError::InvalidSnapshotContract);
        }
        if self.store().cast_vote(election, voter)?.is_some() {
            return Err(GovernanceError::VoteAlreadyCast(*voter));
        }
        let source = self
            .directory()
            .resolve(provider)
            .ok_or(GovernanceError::InvalidSnapshotContract)?;

        let power = source
            .balance_at(snapshot, voter)
            .map_err(provider_failure)?;

        let mut ballot = self
            .store()
            .ballot(election, voter, council.local_chain)?
            .unwrap_or_default();
        if let Some(destination) = ballot.exported_to {
            return Err(GovernanceError::BallotExported {
                voter: *voter,
                destination,
            });
        }
        ballot.set_contribution(*provider, power);
        let total = ballot.voting_power();

        let mut changes = ChangeSet::new();
        changes.put_ballot(election, *voter, council.local_chain, ballot);
        self.commit(changes)?;
        self.bump("ballots_prepared");

        tracing::debug!(%election, %voter, %provider, power, total, "ballot prepared");
        Ok(power)
    }

    /// Vote power recorded for `voter` in one precinct; zero when absent.
    /// An exported ballot still reports the power it carried.
    pub fn ballot_voting_power(
        &self,
        election: ElectionId,
        voter: &Address,
        precinct: ChainId,
    ) -> Result<u128, GovernanceError> {
        Ok(self
            .store()
            .ballot(election, voter, precinct)?
            .map(|b| b.voting_power())
            .unwrap_or(0))
    }

    /// Vote power `voter` can cast here, across every precinct. Ballots
    /// exported to another precinct count for nothing.
    pub fn total_voting_power(
        &self,
        election: ElectionId,
        voter: &Address,
    ) -> Result<u128, GovernanceError> {
        Ok(self
            .store()
            .ballots_for(election, voter)?
            .iter()
            .fold(0u128, |acc, (_, b)| acc.saturating_add(b.spendable_power())))
    }
}
