//! LMDB implementation of RelayStore.

use council_store::{ConsumedMessage, GuardianSet, OutboundRecord, RelayStore, StoreError};
use council_types::{ChainId, MessageHash};

use crate::environment::LmdbEnvironment;
use crate::keys::{chain_sequence_key, read_u64};
use crate::LmdbError;

impl RelayStore for LmdbEnvironment {
    fn consumed(&self, hash: &MessageHash) -> Result<Option<ConsumedMessage>, StoreError> {
        Ok(self.get_decoded(&self.consumed_db, hash.as_bytes())?)
    }

    fn consumed_sequence(
        &self,
        origin: ChainId,
        sequence: u64,
    ) -> Result<Option<MessageHash>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = chain_sequence_key(origin, sequence);
        match self
            .consumed_sequences_db
            .get(&rtxn, &key[..])
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| StoreError::Corruption("consumed sequence value".into()))?;
                Ok(Some(MessageHash::new(arr)))
            }
            None => Ok(None),
        }
    }

    fn guardian_set(&self, chain: ChainId) -> Result<Option<GuardianSet>, StoreError> {
        Ok(self.get_decoded(&self.guardians_db, &chain.to_be_bytes())?)
    }

    fn last_outbound_sequence(&self) -> Result<Option<u64>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self.outbound_db.last(&rtxn).map_err(LmdbError::from)? {
            Some((key, _)) => read_u64(key)
                .map(Some)
                .ok_or_else(|| StoreError::Corruption("outbound key".into())),
            None => Ok(None),
        }
    }

    fn outbound_since(&self, after: u64) -> Result<Vec<OutboundRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in self.outbound_db.rev_iter(&rtxn).map_err(LmdbError::from)? {
            let (key, value) = entry.map_err(LmdbError::from)?;
            let sequence =
                read_u64(key).ok_or_else(|| StoreError::Corruption("outbound key".into()))?;
            if sequence <= after {
                break;
            }
            out.push(bincode::deserialize(value).map_err(LmdbError::from)?);
        }
        out.reverse();
        Ok(out)
    }
}
