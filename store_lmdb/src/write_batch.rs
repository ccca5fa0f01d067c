//! Atomic commit of a [`ChangeSet`].
//!
//! Every change in the set is written inside one LMDB write transaction. If
//! any write fails the transaction is dropped without committing, which
//! aborts it, so the database never holds half an operation.

use heed::RwTxn;

use council_store::{Change, ChangeSet, GovernanceStore, StoreError};

use crate::environment::LmdbEnvironment;
use crate::keys::{
    ballot_key, chain_sequence_key, election_address_key, election_chain_key, election_key,
    COUNCIL_KEY,
};
use crate::snapshot::{DISABLED, ENABLED};
use crate::LmdbError;

impl GovernanceStore for LmdbEnvironment {
    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let count = changes.len();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for change in changes {
            self.apply(&mut wtxn, change)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::trace!(changes = count, "committed change set");
        Ok(())
    }
}

impl LmdbEnvironment {
    fn apply(&self, wtxn: &mut RwTxn, change: Change) -> Result<(), LmdbError> {
        match change {
            Change::PutCouncil(council) => {
                self.council_db
                    .put(wtxn, COUNCIL_KEY, &bincode::serialize(&council)?)?;
            }
            Change::PutElection(id, record) => {
                self.elections_db
                    .put(wtxn, &election_key(id)[..], &bincode::serialize(&record)?)?;
            }
            Change::PutRemoteTally {
                election,
                origin,
                tally,
            } => {
                self.remote_tallies_db.put(
                    wtxn,
                    &election_chain_key(election, origin)[..],
                    &bincode::serialize(&tally)?,
                )?;
            }
            Change::SetProviderEnabled { provider, enabled } => {
                let value = if enabled { ENABLED } else { DISABLED };
                self.providers_db
                    .put(wtxn, &provider.as_bytes()[..], value)?;
            }
            Change::PutSnapshotId {
                election,
                provider,
                id,
            } => {
                self.snapshots_db.put(
                    wtxn,
                    &election_address_key(election, &provider)[..],
                    &id.0.to_be_bytes()[..],
                )?;
            }
            Change::PutBallot {
                election,
                voter,
                precinct,
                ballot,
            } => {
                self.ballots_db.put(
                    wtxn,
                    &ballot_key(election, &voter, precinct)[..],
                    &bincode::serialize(&ballot)?,
                )?;
            }
            Change::PutCastVote {
                election,
                voter,
                vote,
            } => {
                self.cast_votes_db.put(
                    wtxn,
                    &election_address_key(election, &voter)[..],
                    &bincode::serialize(&vote)?,
                )?;
            }
            Change::MarkConsumed { hash, record } => {
                self.consumed_sequences_db.put(
                    wtxn,
                    &chain_sequence_key(record.origin, record.sequence)[..],
                    &hash.as_bytes()[..],
                )?;
                self.consumed_db
                    .put(wtxn, &hash.as_bytes()[..], &bincode::serialize(&record)?)?;
            }
            Change::PutGuardianSet(set) => {
                self.guardians_db.put(
                    wtxn,
                    &set.chain.to_be_bytes()[..],
                    &bincode::serialize(&set)?,
                )?;
            }
            Change::AppendOutbound(record) => {
                self.outbound_db.put(
                    wtxn,
                    &record.sequence.to_be_bytes()[..],
                    &bincode::serialize(&record)?,
                )?;
            }
        }
        Ok(())
    }
}
