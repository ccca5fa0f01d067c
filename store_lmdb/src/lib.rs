//! LMDB storage backend for the council election engine.
//!
//! Implements every storage trait from `council-store` using the `heed` LMDB
//! bindings. Each logical store maps to one named database within a single
//! environment; [`council_store::GovernanceStore::commit`] applies a whole
//! change set inside one write transaction.

pub mod ballot;
pub mod election;
pub mod environment;
pub mod error;
mod keys;
pub mod relay;
pub mod snapshot;
pub mod write_batch;

pub use environment::{LmdbEnvironment, CURRENT_SCHEMA_VERSION, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
