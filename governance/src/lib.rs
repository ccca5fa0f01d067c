//! Council elections for a multi-chain deployment.
//!
//! Each chain runs one [`GovernanceEngine`]. An election epoch moves through
//! Administration, Nomination, Voting and Evaluation purely as a function of
//! time. Vote power comes from balances frozen by snapshot providers during
//! Nomination; each chain is a precinct whose ballots and tallies reach other
//! precincts as guardian-signed messages, applied at most once by hash.

pub mod ballot;
pub mod clock;
pub mod council;
pub mod engine;
pub mod error;
pub mod provider;
pub mod registry;
pub mod relay;
pub mod schedule;
pub mod snapshot;

pub use clock::{Clock, SystemClock};
pub use council::{aggregate_tally, rank_winners};
pub use engine::GovernanceEngine;
pub use error::GovernanceError;
pub use provider::{ProviderDirectory, ProviderError, SnapshotProvider};
pub use schedule::{validate_adjustment, validate_schedule};
