//! Nullable store: thread-safe in-memory storage for testing.

use council_store::{
    BallotRecord, BallotStore, CastVoteRecord, Change, ChangeSet, ConsumedMessage, CouncilState,
    ElectionRecord, ElectionStore, GovernanceStore, GuardianSet, OutboundRecord, RelayStore,
    SnapshotStore, StoreError, Tally,
};
use council_types::{Address, ChainId, ElectionId, MessageHash, SnapshotId};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Default)]
struct State {
    council: Option<CouncilState>,
    elections: BTreeMap<ElectionId, ElectionRecord>,
    remote_tallies: BTreeMap<(ElectionId, ChainId), Tally>,
    providers: BTreeMap<Address, bool>,
    snapshots: BTreeMap<(ElectionId, Address), SnapshotId>,
    ballots: BTreeMap<(ElectionId, Address, ChainId), BallotRecord>,
    cast_votes: BTreeMap<(ElectionId, Address), CastVoteRecord>,
    consumed: BTreeMap<MessageHash, ConsumedMessage>,
    consumed_sequences: BTreeMap<(ChainId, u64), MessageHash>,
    guardians: BTreeMap<ChainId, GuardianSet>,
    outbound: BTreeMap<u64, OutboundRecord>,
}

impl State {
    fn apply(&mut self, change: Change) {
        match change {
            Change::PutCouncil(council) => self.council = Some(council),
            Change::PutElection(id, record) => {
                self.elections.insert(id, record);
            }
            Change::PutRemoteTally {
                election,
                origin,
                tally,
            } => {
                self.remote_tallies.insert((election, origin), tally);
            }
            Change::SetProviderEnabled { provider, enabled } => {
                self.providers.insert(provider, enabled);
            }
            Change::PutSnapshotId {
                election,
                provider,
                id,
            } => {
                self.snapshots.insert((election, provider), id);
            }
            Change::PutBallot {
                election,
                voter,
                precinct,
                ballot,
            } => {
                self.ballots.insert((election, voter, precinct), ballot);
            }
            Change::PutCastVote {
                election,
                voter,
                vote,
            } => {
                self.cast_votes.insert((election, voter), vote);
            }
            Change::MarkConsumed { hash, record } => {
                self.consumed_sequences
                    .insert((record.origin, record.sequence), hash);
                self.consumed.insert(hash, record);
            }
            Change::PutGuardianSet(set) => {
                self.guardians.insert(set.chain, set);
            }
            Change::AppendOutbound(record) => {
                self.outbound.insert(record.sequence, record);
            }
        }
    }
}

/// An in-memory governance store for testing.
/// Thread-safe; a whole change set is applied under one lock.
#[derive(Default)]
pub struct NullStore {
    state: Mutex<State>,
    fail_commits: Mutex<bool>,
    commits: Mutex<u64>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("null store poisoned".into()))
    }

    /// Make every commit fail without applying anything.
    pub fn set_fail_commits(&self, fail: bool) {
        if let Ok(mut f) = self.fail_commits.lock() {
            *f = fail;
        }
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> u64 {
        self.commits.lock().map(|c| *c).unwrap_or(0)
    }
}

impl ElectionStore for NullStore {
    fn council(&self) -> Result<Option<CouncilState>, StoreError> {
        Ok(self.state()?.council.clone())
    }

    fn election(&self, id: ElectionId) -> Result<Option<ElectionRecord>, StoreError> {
        Ok(self.state()?.elections.get(&id).cloned())
    }

    fn remote_tallies(&self, id: ElectionId) -> Result<Vec<(ChainId, Tally)>, StoreError> {
        Ok(self
            .state()?
            .remote_tallies
            .iter()
            .filter(|((e, _), _)| *e == id)
            .map(|((_, chain), t)| (*chain, t.clone()))
            .collect())
    }
}

impl SnapshotStore for NullStore {
    fn provider_enabled(&self, provider: &Address) -> Result<bool, StoreError> {
        Ok(self
            .state()?
            .providers
            .get(provider)
            .copied()
            .unwrap_or(false))
    }

    fn enabled_providers(&self) -> Result<Vec<Address>, StoreError> {
        Ok(self
            .state()?
            .providers
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(p, _)| *p)
            .collect())
    }

    fn snapshot_id(&self, election: ElectionId, provider: &Address) -> Result<SnapshotId, StoreError> {
        Ok(self
            .state()?
            .snapshots
            .get(&(election, *provider))
            .copied()
            .unwrap_or(SnapshotId::NONE))
    }
}

impl BallotStore for NullStore {
    fn ballot(
        &self,
        election: ElectionId,
        voter: &Address,
        precinct: ChainId,
    ) -> Result<Option<BallotRecord>, StoreError> {
        Ok(self
            .state()?
            .ballots
            .get(&(election, *voter, precinct))
            .cloned())
    }

    fn ballots_for(
        &self,
        election: ElectionId,
        voter: &Address,
    ) -> Result<Vec<(ChainId, BallotRecord)>, StoreError> {
        Ok(self
            .state()?
            .ballots
            .iter()
            .filter(|((e, v, _), _)| *e == election && v == voter)
            .map(|((_, _, chain), b)| (*chain, b.clone()))
            .collect())
    }

    fn cast_vote(
        &self,
        election: ElectionId,
        voter: &Address,
    ) -> Result<Option<CastVoteRecord>, StoreError> {
        Ok(self.state()?.cast_votes.get(&(election, *voter)).cloned())
    }
}

impl RelayStore for NullStore {
    fn consumed(&self, hash: &MessageHash) -> Result<Option<ConsumedMessage>, StoreError> {
        Ok(self.state()?.consumed.get(hash).cloned())
    }

    fn consumed_sequence(
        &self,
        origin: ChainId,
        sequence: u64,
    ) -> Result<Option<MessageHash>, StoreError> {
        Ok(self.state()?.consumed_sequences.get(&(origin, sequence)).copied())
    }

    fn guardian_set(&self, chain: ChainId) -> Result<Option<GuardianSet>, StoreError> {
        Ok(self.state()?.guardians.get(&chain).cloned())
    }

    fn last_outbound_sequence(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.state()?.outbound.keys().next_back().copied())
    }

    fn outbound_since(&self, after: u64) -> Result<Vec<OutboundRecord>, StoreError> {
        Ok(self
            .state()?
            .outbound
            .range(after.saturating_add(1)..)
            .map(|(_, r)| r.clone())
            .collect())
    }
}

impl GovernanceStore for NullStore {
    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        if self.fail_commits.lock().map(|f| *f).unwrap_or(false) {
            return Err(StoreError::Backend("commit refused".into()));
        }
        let mut state = self.state()?;
        for change in changes {
            state.apply(change);
        }
        drop(state);
        if let Ok(mut c) = self.commits.lock() {
            *c += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_types::{EpochSchedule, Timestamp};

    #[test]
    fn empty_store_reads_defaults() {
        let store = NullStore::new();
        assert!(store.council().unwrap().is_none());
        assert!(!store.provider_enabled(&Address::repeat_byte(1)).unwrap());
        assert_eq!(
            store
                .snapshot_id(ElectionId::FIRST, &Address::repeat_byte(1))
                .unwrap(),
            SnapshotId::NONE
        );
        assert_eq!(store.last_outbound_sequence().unwrap(), None);
    }

    #[test]
    fn commit_applies_every_change() {
        let store = NullStore::new();
        let schedule = EpochSchedule {
            administration_start: Timestamp::new(0),
            nomination_start: Timestamp::new(10),
            voting_start: Timestamp::new(20),
            evaluation_start: Timestamp::new(30),
        };
        let mut changes = ChangeSet::new();
        changes
            .put_election(ElectionId::FIRST, ElectionRecord::new(schedule))
            .set_provider_enabled(Address::repeat_byte(1), true)
            .put_ballot(
                ElectionId::FIRST,
                Address::repeat_byte(2),
                ChainId(1),
                BallotRecord::default(),
            );
        store.commit(changes).unwrap();

        assert!(store.election(ElectionId::FIRST).unwrap().is_some());
        assert!(store.provider_enabled(&Address::repeat_byte(1)).unwrap());
        assert_eq!(
            store
                .ballots_for(ElectionId::FIRST, &Address::repeat_byte(2))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn failed_commit_applies_nothing() {
        let store = NullStore::new();
        store.set_fail_commits(true);
        let mut changes = ChangeSet::new();
        changes.set_provider_enabled(Address::repeat_byte(1), true);
        assert!(store.commit(changes).is_err());
        assert!(!store.provider_enabled(&Address::repeat_byte(1)).unwrap());
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn outbound_since_is_exclusive() {
        let store = NullStore::new();
        let mut changes = ChangeSet::new();
        for sequence in 1..=3 {
            changes.append_outbound(OutboundRecord {
                sequence,
                destination: ChainId(2),
                payload: vec![sequence as u8],
                hash: MessageHash::ZERO,
                emitted_at: Timestamp::new(0),
            });
        }
        store.commit(changes).unwrap();
        let seqs: Vec<u64> = store
            .outbound_since(1)
            .unwrap()
            .iter()
            .map(|r| r.sequence)
            .collect();
        assert_eq!(seqs, vec![2, 3]);
        assert_eq!(store.last_outbound_sequence().unwrap(), Some(3));
    }
}
