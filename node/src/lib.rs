//! Council node: wires the governance engine to its environment.
//!
//! The node owns:
//! - LMDB storage for councils, elections, ballots and the relay ledger
//! - Snapshot providers loaded from balance history files
//! - Trusted guardian sets and this node's own guardian key
//! - Outbox polling for whatever transport carries messages between chains

pub mod config;
pub mod error;
pub mod node;
pub mod provider;
pub mod watch;

pub use config::{GuardianKeyConfig, GuardianSetConfig, NodeConfig, ProviderConfig};
pub use error::NodeError;
pub use node::{GovernanceNode, NodeEngine, NodeStatus};
pub use provider::{checkpoint_at, BalanceHistoryProvider, ConfiguredProviders};
pub use watch::watch_outbox;
