//! LMDB implementation of SnapshotStore.

use council_store::{SnapshotStore, StoreError};
use council_types::{Address, ElectionId, SnapshotId};

use crate::environment::LmdbEnvironment;
use crate::keys::election_address_key;
use crate::LmdbError;

pub(crate) const ENABLED: &[u8] = &[1];
pub(crate) const DISABLED: &[u8] = &[0];

impl SnapshotStore for LmdbEnvironment {
    fn provider_enabled(&self, provider: &Address) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let value = self
            .providers_db
            .get(&rtxn, &provider.as_bytes()[..])
            .map_err(LmdbError::from)?;
        Ok(value == Some(ENABLED))
    }

    fn enabled_providers(&self) -> Result<Vec<Address>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in self.providers_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, value) = entry.map_err(LmdbError::from)?;
            if value != ENABLED {
                continue;
            }
            let bytes: [u8; 20] = key
                .try_into()
                .map_err(|_| StoreError::Corruption("provider key must be 20 bytes".into()))?;
            out.push(Address::new(bytes));
        }
        Ok(out)
    }

    fn snapshot_id(
        &self,
        election: ElectionId,
        provider: &Address,
    ) -> Result<SnapshotId, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = election_address_key(election, provider);
        match self.snapshots_db.get(&rtxn, &key[..]).map_err(LmdbError::from)? {
            Some(bytes) => {
                let arr: [u8; 16] = bytes
                    .try_into()
                    .map_err(|_| StoreError::Corruption("snapshot id must be 16 bytes".into()))?;
                Ok(SnapshotId(u128::from_be_bytes(arr)))
            }
            None => Ok(SnapshotId::NONE),
        }
    }
}
