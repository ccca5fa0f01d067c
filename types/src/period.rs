//! Election periods and the schedule that bounds them.
//!
//! The current period is never stored: it is derived from the schedule and a
//! timestamp every time it is needed.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four phases of one election epoch, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EpochPeriod {
    /// Council governs; the schedule may be adjusted.
    Administration,
    /// Candidates register; vote power snapshots are frozen.
    Nomination,
    /// Ballots are prepared and votes cast.
    Voting,
    /// Results are tallied and the epoch is resolved.
    Evaluation,
}

impl EpochPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administration => "administration",
            Self::Nomination => "nomination",
            Self::Voting => "voting",
            Self::Evaluation => "evaluation",
        }
    }
}

impl fmt::Display for EpochPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundaries of one election epoch.
///
/// Evaluation has no end boundary: it lasts until the epoch is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSchedule {
    pub administration_start: Timestamp,
    pub nomination_start: Timestamp,
    pub voting_start: Timestamp,
    pub evaluation_start: Timestamp,
}

impl EpochSchedule {
    /// The period in effect at `now`.
    pub fn period_at(&self, now: Timestamp) -> EpochPeriod {
        if now < self.nomination_start {
            EpochPeriod::Administration
        } else if now < self.voting_start {
            EpochPeriod::Nomination
        } else if now < self.evaluation_start {
            EpochPeriod::Voting
        } else {
            EpochPeriod::Evaluation
        }
    }

    /// Administration start <= nomination start < voting start < evaluation start.
    pub fn is_monotonic(&self) -> bool {
        self.administration_start <= self.nomination_start
            && self.nomination_start < self.voting_start
            && self.voting_start < self.evaluation_start
    }

    pub fn nomination_duration(&self) -> u64 {
        self.voting_start.secs_since(self.nomination_start)
    }

    pub fn voting_duration(&self) -> u64 {
        self.evaluation_start.secs_since(self.voting_start)
    }

    pub fn epoch_duration(&self) -> u64 {
        self.evaluation_start.secs_since(self.administration_start)
    }

    /// Largest distance any single boundary moved between `self` and `other`.
    pub fn max_boundary_shift(&self, other: &EpochSchedule) -> u64 {
        [
            self.administration_start.abs_diff(other.administration_start),
            self.nomination_start.abs_diff(other.nomination_start),
            self.voting_start.abs_diff(other.voting_start),
            self.evaluation_start.abs_diff(other.evaluation_start),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}
