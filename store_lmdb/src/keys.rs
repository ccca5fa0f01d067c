//! Binary key layouts. Integers are big-endian so LMDB's lexicographic order
//! matches numeric order and composite keys group by their leading parts.

use council_types::{Address, ChainId, ElectionId};

pub(crate) const COUNCIL_KEY: &[u8] = b"council";
pub(crate) const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

pub(crate) fn election_key(election: ElectionId) -> [u8; 8] {
    election.to_be_bytes()
}

pub(crate) fn election_chain_key(election: ElectionId, chain: ChainId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&election.to_be_bytes());
    key[8..].copy_from_slice(&chain.to_be_bytes());
    key
}

pub(crate) fn election_address_key(election: ElectionId, address: &Address) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..8].copy_from_slice(&election.to_be_bytes());
    key[8..].copy_from_slice(address.as_bytes());
    key
}

pub(crate) fn ballot_key(election: ElectionId, voter: &Address, precinct: ChainId) -> [u8; 36] {
    let mut key = [0u8; 36];
    key[..28].copy_from_slice(&election_address_key(election, voter));
    key[28..].copy_from_slice(&precinct.to_be_bytes());
    key
}

pub(crate) fn chain_sequence_key(chain: ChainId, sequence: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&chain.to_be_bytes());
    key[8..].copy_from_slice(&sequence.to_be_bytes());
    key
}

pub(crate) fn read_u64(bytes: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}
