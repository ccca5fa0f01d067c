//! LMDB implementation of BallotStore.

use council_store::{BallotRecord, BallotStore, CastVoteRecord, StoreError};
use council_types::{Address, ChainId, ElectionId};

use crate::environment::LmdbEnvironment;
use crate::keys::{ballot_key, election_address_key, read_u64};
use crate::LmdbError;

impl BallotStore for LmdbEnvironment {
    fn ballot(
        &self,
        election: ElectionId,
        voter: &Address,
        precinct: ChainId,
    ) -> Result<Option<BallotRecord>, StoreError> {
        Ok(self.get_decoded(&self.ballots_db, &ballot_key(election, voter, precinct))?)
    }

    fn ballots_for(
        &self,
        election: ElectionId,
        voter: &Address,
    ) -> Result<Vec<(ChainId, BallotRecord)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = election_address_key(election, voter);
        let mut out = Vec::new();
        for entry in self
            .ballots_db
            .prefix_iter(&rtxn, &prefix[..])
            .map_err(LmdbError::from)?
        {
            let (key, value) = entry.map_err(LmdbError::from)?;
            let precinct = read_u64(&key[prefix.len()..])
                .ok_or_else(|| StoreError::Corruption("ballot key".into()))?;
            let ballot: BallotRecord = bincode::deserialize(value).map_err(LmdbError::from)?;
            out.push((ChainId(precinct), ballot));
        }
        Ok(out)
    }

    fn cast_vote(
        &self,
        election: ElectionId,
        voter: &Address,
    ) -> Result<Option<CastVoteRecord>, StoreError> {
        Ok(self.get_decoded(&self.cast_votes_db, &election_address_key(election, voter))?)
    }
}
