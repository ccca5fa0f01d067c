//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::keys::SCHEMA_VERSION_KEY;
use crate::LmdbError;

/// The schema version this code writes and understands.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Default LMDB map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

const MAX_DBS: u32 = 16;

pub(crate) type RawDb = Database<Bytes, Bytes>;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    pub(crate) env: Env,
    pub(crate) meta_db: RawDb,
    pub(crate) council_db: RawDb,
    pub(crate) elections_db: RawDb,
    /// (election, origin chain) → tally
    pub(crate) remote_tallies_db: RawDb,
    /// provider → [0|1]
    pub(crate) providers_db: RawDb,
    /// (election, provider) → snapshot id (u128 BE)
    pub(crate) snapshots_db: RawDb,
    /// (election, voter, precinct) → ballot
    pub(crate) ballots_db: RawDb,
    /// (election, voter) → cast vote
    pub(crate) cast_votes_db: RawDb,
    /// message hash → consumption record
    pub(crate) consumed_db: RawDb,
    /// (origin chain, sequence) → message hash
    pub(crate) consumed_sequences_db: RawDb,
    /// origin chain → guardian set
    pub(crate) guardians_db: RawDb,
    /// sequence → outbound record
    pub(crate) outbound_db: RawDb,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    ///
    /// Refuses databases written under any other schema version.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Heed(e.to_string()))?;

        // SAFETY: the environment directory is owned by this process; no other
        // handle to the same path is opened with different flags.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let meta_db: RawDb = env.create_database(&mut wtxn, Some("meta"))?;
        let council_db: RawDb = env.create_database(&mut wtxn, Some("council"))?;
        let elections_db: RawDb = env.create_database(&mut wtxn, Some("elections"))?;
        let remote_tallies_db: RawDb = env.create_database(&mut wtxn, Some("remote_tallies"))?;
        let providers_db: RawDb = env.create_database(&mut wtxn, Some("providers"))?;
        let snapshots_db: RawDb = env.create_database(&mut wtxn, Some("snapshots"))?;
        let ballots_db: RawDb = env.create_database(&mut wtxn, Some("ballots"))?;
        let cast_votes_db: RawDb = env.create_database(&mut wtxn, Some("cast_votes"))?;
        let consumed_db: RawDb = env.create_database(&mut wtxn, Some("consumed"))?;
        let consumed_sequences_db: RawDb =
            env.create_database(&mut wtxn, Some("consumed_sequences"))?;
        let guardians_db: RawDb = env.create_database(&mut wtxn, Some("guardians"))?;
        let outbound_db: RawDb = env.create_database(&mut wtxn, Some("outbound"))?;

        let stored = match meta_db.get(&wtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("schema version must be 4 bytes".into())
                })?;
                Some(u32::from_le_bytes(arr))
            }
            None => None,
        };
        match stored {
            Some(v) if v != CURRENT_SCHEMA_VERSION => {
                return Err(LmdbError::SchemaVersion {
                    found: v,
                    supported: CURRENT_SCHEMA_VERSION,
                });
            }
            Some(v) => {
                tracing::debug!(version = v, "database schema is up to date");
            }
            None => {
                meta_db.put(
                    &mut wtxn,
                    SCHEMA_VERSION_KEY,
                    &CURRENT_SCHEMA_VERSION.to_le_bytes(),
                )?;
                tracing::info!(
                    version = CURRENT_SCHEMA_VERSION,
                    path = %path.display(),
                    "initialized new governance database"
                );
            }
        }
        wtxn.commit()?;

        Ok(Self {
            env,
            meta_db,
            council_db,
            elections_db,
            remote_tallies_db,
            providers_db,
            snapshots_db,
            ballots_db,
            cast_votes_db,
            consumed_db,
            consumed_sequences_db,
            guardians_db,
            outbound_db,
        })
    }

    /// The stored schema version.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let bytes = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)?
            .ok_or_else(|| LmdbError::NotFound("schema_version".into()))?;
        let arr: [u8; 4] = bytes
            .try_into()
            .map_err(|_| LmdbError::Serialization("schema version must be 4 bytes".into()))?;
        Ok(u32::from_le_bytes(arr))
    }

    pub(crate) fn get_decoded<T: serde::de::DeserializeOwned>(
        &self,
        db: &RawDb,
        key: &[u8],
    ) -> Result<Option<T>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match db.get(&rtxn, key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_environment_records_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        assert_eq!(env.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }

    fn reopen_with_version(version: u32) -> Result<LmdbEnvironment, LmdbError> {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
            let mut wtxn = env.env.write_txn().unwrap();
            env.meta_db
                .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())
                .unwrap();
            wtxn.commit().unwrap();
        }
        LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024)
    }

    #[test]
    fn newer_schema_is_refused() {
        assert!(matches!(
            reopen_with_version(99),
            Err(LmdbError::SchemaVersion { found: 99, .. })
        ));
    }

    #[test]
    fn older_schema_is_refused() {
        assert!(matches!(
            reopen_with_version(1),
            Err(LmdbError::SchemaVersion { found: 1, supported: 2 })
        ));
    }
}
