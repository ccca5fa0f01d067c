//! Ballot storage: per-precinct vote power and cast votes.

use crate::StoreError;
use council_types::{Address, ChainId, ElectionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vote power one voter holds in one precinct for one election.
///
/// Each provider contributes at most one entry, so re-preparing a ballot with
/// the same provider replaces its contribution instead of adding to it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotRecord {
    pub contributions: BTreeMap<Address, u128>,
    /// Set once the ballot's power has been sent to another precinct. From
    /// then on it is spent there and can neither be voted nor re-prepared
    /// here.
    pub exported_to: Option<ChainId>,
}

impl BallotRecord {
    pub fn voting_power(&self) -> u128 {
        self.contributions
            .values()
            .fold(0u128, |acc, v| acc.saturating_add(*v))
    }

    /// Power that can still be voted in this precinct.
    pub fn spendable_power(&self) -> u128 {
        if self.exported_to.is_some() {
            0
        } else {
            self.voting_power()
        }
    }

    /// Replace one provider's contribution.
    pub fn set_contribution(&mut self, provider: Address, power: u128) {
        self.contributions.insert(provider, power);
    }
}

/// A voter's cast vote. Its existence freezes the voter's ballots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVoteRecord {
    pub candidates: Vec<Address>,
    pub amounts: Vec<u128>,
    pub total_power: u128,
}

/// Trait for ballot storage operations.
pub trait BallotStore {
    /// The ballot for `(election, voter, precinct)`, if any power was recorded.
    fn ballot(
        &self,
        election: ElectionId,
        voter: &Address,
        precinct: ChainId,
    ) -> Result<Option<BallotRecord>, StoreError>;

    /// Every precinct ballot a voter holds in an election.
    fn ballots_for(
        &self,
        election: ElectionId,
        voter: &Address,
    ) -> Result<Vec<(ChainId, BallotRecord)>, StoreError>;

    /// The voter's cast vote in an election, if any.
    fn cast_vote(
        &self,
        election: ElectionId,
        voter: &Address,
    ) -> Result<Option<CastVoteRecord>, StoreError>;
}
