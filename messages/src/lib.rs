//! Cross-chain governance messages.
//!
//! A precinct emits [`GovernancePayload`]s; an external transport carries
//! them to other precincts inside an [`Envelope`] signed by the origin
//! chain's guardians. The receiving side recomputes [`message_hash`],
//! checks the guardian quorum, and deduplicates by that hash.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod payload;

pub use codec::{message_hash, MAX_PAYLOAD_SIZE, PAYLOAD_VERSION};
pub use envelope::{Envelope, GuardianSignature};
pub use error::MessageError;
pub use payload::GovernancePayload;
