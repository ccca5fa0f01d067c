//! Payload encoding and message hashing.
//!
//! Payloads are a one-byte version followed by the bincode encoding of a
//! [`GovernancePayload`]. The message hash binds the origin chain and the
//! origin's sequence number to the payload bytes.

use crate::error::MessageError;
use crate::payload::GovernancePayload;
use council_types::{ChainId, MessageHash};

/// Current payload encoding version.
pub const PAYLOAD_VERSION: u8 = 1;

/// Maximum encoded payload size in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

const HASH_DOMAIN: &[u8] = b"council-relay";

/// Encode a payload for emission.
pub fn encode_payload(payload: &GovernancePayload) -> Result<Vec<u8>, MessageError> {
    let body = bincode::serialize(payload).map_err(|e| MessageError::Malformed(e.to_string()))?;
    let size = body.len() + 1;
    if size > MAX_PAYLOAD_SIZE {
        return Err(MessageError::PayloadTooLarge {
            size,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    let mut out = Vec::with_capacity(size);
    out.push(PAYLOAD_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode payload bytes received from another precinct.
pub fn decode_payload(data: &[u8]) -> Result<GovernancePayload, MessageError> {
    if data.len() > MAX_PAYLOAD_SIZE {
        return Err(MessageError::PayloadTooLarge {
            size: data.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }
    let (&version, body) = data
        .split_first()
        .ok_or_else(|| MessageError::Malformed("empty payload".into()))?;
    if version != PAYLOAD_VERSION {
        return Err(MessageError::UnsupportedVersion(version));
    }
    bincode::deserialize(body).map_err(|e| MessageError::Malformed(e.to_string()))
}

/// `blake2b(domain || origin || sequence || payload)`.
pub fn message_hash(origin: ChainId, sequence: u64, payload: &[u8]) -> MessageHash {
    MessageHash::new(council_crypto::blake2b_256_multi(&[
        HASH_DOMAIN,
        &origin.to_be_bytes(),
        &sequence.to_be_bytes(),
        payload,
    ]))
}
