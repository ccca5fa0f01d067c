//! Cryptographic primitives for the council election engine.
//!
//! - **Ed25519** for guardian signatures over cross-chain envelopes
//! - **Blake2b** for message hashing (the relay dedup key)
//! - Guardian key generation from 32-byte seeds

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, generate_seed, keypair_from_seed};
pub use sign::{sign_message, verify_signature};
