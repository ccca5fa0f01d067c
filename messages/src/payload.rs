//! What one precinct tells another.

use crate::codec;
use crate::error::MessageError;
use council_types::{Address, ElectionId};
use serde::{Deserialize, Serialize};

/// Body of a cross-chain governance message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernancePayload {
    /// A candidate registered on the origin chain.
    NominationAnnounced {
        election: ElectionId,
        candidate: Address,
    },
    /// Vote power a voter prepared on the origin chain, per provider.
    BallotPower {
        election: ElectionId,
        voter: Address,
        contributions: Vec<(Address, u128)>,
    },
    /// Votes cast on the origin chain, per candidate.
    Tally {
        election: ElectionId,
        votes: Vec<(Address, u128)>,
    },
}

impl GovernancePayload {
    /// The election this payload belongs to.
    pub fn election(&self) -> ElectionId {
        match self {
            Self::NominationAnnounced { election, .. }
            | Self::BallotPower { election, .. }
            | Self::Tally { election, .. } => *election,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NominationAnnounced { .. } => "nomination",
            Self::BallotPower { .. } => "ballot_power",
            Self::Tally { .. } => "tally",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        codec::encode_payload(self)
    }

    pub fn decode(data: &[u8]) -> Result<Self, MessageError> {
        codec::decode_payload(data)
    }
}
