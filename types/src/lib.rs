//! Fundamental types for the council election engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, chain and election identifiers, snapshot ids, message hashes,
//! timestamps, epoch schedules, and election settings.

pub mod address;
pub mod error;
pub mod hash;
pub mod ids;
pub mod keys;
pub mod params;
pub mod period;
pub mod time;

pub use address::Address;
pub use error::TypeError;
pub use hash::MessageHash;
pub use ids::{ChainId, ElectionId, SnapshotId};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::ElectionSettings;
pub use period::{EpochPeriod, EpochSchedule};
pub use time::Timestamp;

/// Vote power is an unsigned balance read from a snapshot provider.
pub type VotePower = u128;
