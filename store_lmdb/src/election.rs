//! LMDB implementation of ElectionStore.

use council_store::{CouncilState, ElectionRecord, ElectionStore, StoreError, Tally};
use council_types::{ChainId, ElectionId};

use crate::environment::LmdbEnvironment;
use crate::keys::{election_key, read_u64, COUNCIL_KEY};
use crate::LmdbError;

impl ElectionStore for LmdbEnvironment {
    fn council(&self) -> Result<Option<CouncilState>, StoreError> {
        Ok(self.get_decoded(&self.council_db, COUNCIL_KEY)?)
    }

    fn election(&self, id: ElectionId) -> Result<Option<ElectionRecord>, StoreError> {
        Ok(self.get_decoded(&self.elections_db, &election_key(id))?)
    }

    fn remote_tallies(&self, id: ElectionId) -> Result<Vec<(ChainId, Tally)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = election_key(id);
        let mut out = Vec::new();
        for entry in self
            .remote_tallies_db
            .prefix_iter(&rtxn, &prefix[..])
            .map_err(LmdbError::from)?
        {
            let (key, value) = entry.map_err(LmdbError::from)?;
            let chain = read_u64(&key[8..])
                .ok_or_else(|| StoreError::Corruption("remote tally key".into()))?;
            let tally: Tally = bincode::deserialize(value).map_err(LmdbError::from)?;
            out.push((ChainId(chain), tally));
        }
        Ok(out)
    }
}
