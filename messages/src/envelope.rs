//! Signed envelopes as delivered by the cross-chain transport.

use crate::codec::message_hash;
use crate::error::MessageError;
use crate::payload::GovernancePayload;
use council_crypto::{sign_message, verify_signature};
use council_types::{ChainId, MessageHash, PrivateKey, PublicKey, Signature};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One guardian's signature over a message hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSignature {
    /// Position of the signer in the origin chain's guardian set.
    pub guardian_index: u8,
    pub signature: Signature,
}

/// A governance message in transit between precincts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: ChainId,
    pub sequence: u64,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    pub signatures: Vec<GuardianSignature>,
}

impl Envelope {
    /// An unsigned envelope around already-encoded payload bytes.
    pub fn new(origin: ChainId, sequence: u64, payload: Vec<u8>) -> Self {
        Self {
            origin,
            sequence,
            payload,
            signatures: Vec::new(),
        }
    }

    /// Encode `payload` and wrap it.
    pub fn from_payload(
        origin: ChainId,
        sequence: u64,
        payload: &GovernancePayload,
    ) -> Result<Self, MessageError> {
        Ok(Self::new(origin, sequence, payload.encode()?))
    }

    /// The dedup key. Signatures are not part of it, so re-signed copies of
    /// one message share a hash.
    pub fn hash(&self) -> MessageHash {
        message_hash(self.origin, self.sequence, &self.payload)
    }

    pub fn decode_payload(&self) -> Result<GovernancePayload, MessageError> {
        GovernancePayload::decode(&self.payload)
    }

    /// Add a guardian signature over [`Envelope::hash`].
    pub fn sign(&mut self, guardian_index: u8, key: &PrivateKey) {
        let signature = sign_message(self.hash().as_bytes(), key);
        self.signatures.push(GuardianSignature {
            guardian_index,
            signature,
        });
    }

    /// Builder form of [`Envelope::sign`].
    pub fn signed_by(mut self, guardian_index: u8, key: &PrivateKey) -> Self {
        self.sign(guardian_index, key);
        self
    }

    /// Number of distinct guardians in `guardians` with a valid signature.
    ///
    /// Out-of-range indices, invalid signatures, and repeated indices count
    /// for nothing.
    pub fn valid_signature_count(&self, guardians: &[PublicKey]) -> usize {
        let hash = self.hash();
        let mut seen = BTreeSet::new();
        for sig in &self.signatures {
            let Some(key) = guardians.get(sig.guardian_index as usize) else {
                continue;
            };
            if seen.contains(&sig.guardian_index) {
                continue;
            }
            if verify_signature(hash.as_bytes(), &sig.signature, key) {
                seen.insert(sig.guardian_index);
            }
        }
        seen.len()
    }

    /// Ok if at least `quorum` distinct guardians signed.
    pub fn verify_quorum(&self, guardians: &[PublicKey], quorum: usize) -> Result<(), MessageError> {
        let valid = self.valid_signature_count(guardians);
        if quorum == 0 || valid < quorum {
            return Err(MessageError::InsufficientSignatures { valid, quorum });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, MessageError> {
        serde_json::to_string(self).map_err(|e| MessageError::Malformed(e.to_string()))
    }

    pub fn from_json(s: &str) -> Result<Self, MessageError> {
        serde_json::from_str(s).map_err(|e| MessageError::Malformed(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        bincode::serialize(self).map_err(|e| MessageError::Malformed(e.to_string()))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, MessageError> {
        bincode::deserialize(data).map_err(|e| MessageError::Malformed(e.to_string()))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
        } else {
            serde_bytes_vec(deserializer)
        }
    }

    fn serde_bytes_vec<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        struct BytesVisitor;

        impl<'de> serde::de::Visitor<'de> for BytesVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a byte buffer")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(v.to_vec())
            }

            fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(v)
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(b) = seq.next_element()? {
                    out.push(b);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_byte_buf(BytesVisitor)
    }
}
