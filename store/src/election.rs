//! Council and election storage.

use crate::StoreError;
use council_types::{Address, ChainId, ElectionId, ElectionSettings, EpochSchedule};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Votes per candidate.
pub type Tally = BTreeMap<Address, u128>;

/// Process-wide council state. There is exactly one per deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilState {
    /// The only principal allowed to call administrative operations.
    pub administrator: Address,
    /// The chain this deployment runs on; the local precinct.
    pub local_chain: ChainId,
    /// Advances only when an epoch is resolved.
    pub current_election: ElectionId,
    pub settings: ElectionSettings,
    /// Winners of the last resolved election.
    pub council_members: Vec<Address>,
}

/// Everything recorded about one election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionRecord {
    pub schedule: EpochSchedule,
    pub nominees: BTreeSet<Address>,
    /// Votes cast on this chain.
    pub local_tally: Tally,
    pub evaluated: bool,
    pub winners: Vec<Address>,
    pub resolved: bool,
}

impl ElectionRecord {
    pub fn new(schedule: EpochSchedule) -> Self {
        Self {
            schedule,
            nominees: BTreeSet::new(),
            local_tally: Tally::new(),
            evaluated: false,
            winners: Vec::new(),
            resolved: false,
        }
    }
}

/// Trait for reading council and election state.
pub trait ElectionStore {
    /// The council singleton, `None` before initialization.
    fn council(&self) -> Result<Option<CouncilState>, StoreError>;

    /// One election's record.
    fn election(&self, id: ElectionId) -> Result<Option<ElectionRecord>, StoreError>;

    /// Tallies relayed from other precincts for an election, by origin.
    fn remote_tallies(&self, id: ElectionId) -> Result<Vec<(ChainId, Tally)>, StoreError>;
}
