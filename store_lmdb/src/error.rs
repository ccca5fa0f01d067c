use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unsupported schema version {found} (supported: {supported})")]
    SchemaVersion { found: u32, supported: u32 },
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for council_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => council_store::StoreError::NotFound(key),
            LmdbError::Serialization(msg) => council_store::StoreError::Serialization(msg),
            LmdbError::SchemaVersion { .. } => council_store::StoreError::Corruption(e.to_string()),
            LmdbError::Heed(msg) => council_store::StoreError::Backend(msg),
        }
    }
}
