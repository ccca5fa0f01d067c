//! Atomic write batches.
//!
//! An engine operation validates everything first, records its writes in a
//! [`ChangeSet`], then hands the set to [`crate::GovernanceStore::commit`].
//! Dropping a change set without committing it writes nothing.

use crate::ballot::{BallotRecord, CastVoteRecord};
use crate::election::{CouncilState, ElectionRecord, Tally};
use crate::relay::{ConsumedMessage, GuardianSet, OutboundRecord};
use council_types::{Address, ChainId, ElectionId, MessageHash, SnapshotId};

/// One pending write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    PutCouncil(CouncilState),
    PutElection(ElectionId, ElectionRecord),
    PutRemoteTally {
        election: ElectionId,
        origin: ChainId,
        tally: Tally,
    },
    SetProviderEnabled {
        provider: Address,
        enabled: bool,
    },
    PutSnapshotId {
        election: ElectionId,
        provider: Address,
        id: SnapshotId,
    },
    PutBallot {
        election: ElectionId,
        voter: Address,
        precinct: ChainId,
        ballot: BallotRecord,
    },
    PutCastVote {
        election: ElectionId,
        voter: Address,
        vote: CastVoteRecord,
    },
    MarkConsumed {
        hash: MessageHash,
        record: ConsumedMessage,
    },
    PutGuardianSet(GuardianSet),
    AppendOutbound(OutboundRecord),
}

/// An ordered batch of writes applied all-or-nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) -> &mut Self {
        self.changes.push(change);
        self
    }

    pub fn put_council(&mut self, council: CouncilState) -> &mut Self {
        self.push(Change::PutCouncil(council))
    }

    pub fn put_election(&mut self, id: ElectionId, record: ElectionRecord) -> &mut Self {
        self.push(Change::PutElection(id, record))
    }

    pub fn put_remote_tally(
        &mut self,
        election: ElectionId,
        origin: ChainId,
        tally: Tally,
    ) -> &mut Self {
        self.push(Change::PutRemoteTally {
            election,
            origin,
            tally,
        })
    }

    pub fn set_provider_enabled(&mut self, provider: Address, enabled: bool) -> &mut Self {
        self.push(Change::SetProviderEnabled { provider, enabled })
    }

    pub fn put_snapshot_id(
        &mut self,
        election: ElectionId,
        provider: Address,
        id: SnapshotId,
    ) -> &mut Self {
        self.push(Change::PutSnapshotId {
            election,
            provider,
            id,
        })
    }

    pub fn put_ballot(
        &mut self,
        election: ElectionId,
        voter: Address,
        precinct: ChainId,
        ballot: BallotRecord,
    ) -> &mut Self {
        self.push(Change::PutBallot {
            election,
            voter,
            precinct,
            ballot,
        })
    }

    pub fn put_cast_vote(
        &mut self,
        election: ElectionId,
        voter: Address,
        vote: CastVoteRecord,
    ) -> &mut Self {
        self.push(Change::PutCastVote {
            election,
            voter,
            vote,
        })
    }

    pub fn mark_consumed(&mut self, hash: MessageHash, record: ConsumedMessage) -> &mut Self {
        self.push(Change::MarkConsumed { hash, record })
    }

    pub fn put_guardian_set(&mut self, set: GuardianSet) -> &mut Self {
        self.push(Change::PutGuardianSet(set))
    }

    pub fn append_outbound(&mut self, record: OutboundRecord) -> &mut Self {
        self.push(Change::AppendOutbound(record))
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
