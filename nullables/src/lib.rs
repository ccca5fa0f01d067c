//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the governance engine (clock, snapshot
//! providers, storage, cross-chain transport) sits behind a trait. This
//! crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod provider;
pub mod store;
pub mod transport;

pub use clock::NullClock;
pub use provider::{NullProviderDirectory, NullSnapshotProvider};
pub use store::NullStore;
pub use transport::{guardian_keys, public_keys, NullTransport};
