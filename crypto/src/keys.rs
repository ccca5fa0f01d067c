//! Ed25519 guardian keys.
//!
//! Guardian keys live on disk as a hex-encoded 32-byte seed; the key pair is
//! always rebuilt from the seed.

use council_types::{KeyPair, PrivateKey, PublicKey};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;

/// A fresh 32-byte seed from the operating system's random source.
pub fn generate_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    seed
}

/// Generate a new key pair and return it with the seed it was built from.
pub fn generate_keypair() -> ([u8; 32], KeyPair) {
    let seed = generate_seed();
    (seed, keypair_from_seed(&seed))
}

/// Rebuild the key pair for a seed (deterministic).
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    let signing_key = SigningKey::from_bytes(seed);
    KeyPair {
        public: PublicKey(signing_key.verifying_key().to_bytes()),
        private: PrivateKey(*seed),
    }
}
