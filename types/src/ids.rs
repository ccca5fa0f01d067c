//! Identifiers for chains (precincts), elections, and provider checkpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain identifier. Doubles as the precinct a unit of vote power came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing election number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElectionId(pub u64);

impl ElectionId {
    /// The first election, created at initialization.
    pub const FIRST: Self = Self(1);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque checkpoint handle returned by a snapshot provider.
///
/// `0` means "no snapshot taken".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SnapshotId(pub u128);

impl SnapshotId {
    pub const NONE: Self = Self(0);

    pub fn is_taken(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn election_ids_advance_by_one() {
        assert_eq!(ElectionId::FIRST.next(), ElectionId(2));
    }

    #[test]
    fn zero_snapshot_is_not_taken() {
        assert!(!SnapshotId::NONE.is_taken());
        assert!(SnapshotId(42).is_taken());
    }

    #[test]
    fn big_endian_bytes_sort_like_numbers() {
        assert!(ElectionId(2).to_be_bytes() < ElectionId(256).to_be_bytes());
    }
}
