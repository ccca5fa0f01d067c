//! Cross-chain relay storage: guardian trust sets, the consumption ledger,
//! and the outbound message log.

use crate::StoreError;
use council_types::{ChainId, MessageHash, PublicKey, Timestamp};
use serde::{Deserialize, Serialize};

/// The guardians trusted to vouch for messages from one origin chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSet {
    pub chain: ChainId,
    pub guardians: Vec<PublicKey>,
    /// Distinct valid guardian signatures required.
    pub quorum: u8,
}

/// Entry in the append-only consumption ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedMessage {
    pub origin: ChainId,
    pub sequence: u64,
    pub consumed_at: Timestamp,
}

/// A message emitted for an external transport to deliver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRecord {
    /// Strictly increasing, starting at 1.
    pub sequence: u64,
    pub destination: ChainId,
    pub payload: Vec<u8>,
    pub hash: MessageHash,
    pub emitted_at: Timestamp,
}

/// Trait for relay storage operations.
pub trait RelayStore {
    /// The consumption record for a hash, if it was ever applied.
    fn consumed(&self, hash: &MessageHash) -> Result<Option<ConsumedMessage>, StoreError>;

    fn is_consumed(&self, hash: &MessageHash) -> Result<bool, StoreError> {
        Ok(self.consumed(hash)?.is_some())
    }

    /// Hash of the message consumed under `(origin, sequence)`, if any.
    ///
    /// Written together with the consumption record, so a second message
    /// claiming the same origin sequence is recognised whatever its payload.
    fn consumed_sequence(
        &self,
        origin: ChainId,
        sequence: u64,
    ) -> Result<Option<MessageHash>, StoreError>;

    fn guardian_set(&self, chain: ChainId) -> Result<Option<GuardianSet>, StoreError>;

    /// Sequence number of the most recent outbound message.
    fn last_outbound_sequence(&self) -> Result<Option<u64>, StoreError>;

    /// Outbound messages with `sequence > after`, in order.
    fn outbound_since(&self, after: u64) -> Result<Vec<OutboundRecord>, StoreError>;
}
