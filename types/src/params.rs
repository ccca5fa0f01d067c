//! Election settings: seat count, period lengths, and schedule guard rails.

use crate::period::EpochSchedule;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

const DAY: u64 = 86_400;

/// Tunable election parameters, owned by the administrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSettings {
    /// Number of council seats filled by each election.
    pub epoch_seat_count: u8,

    /// Length of a full epoch, administration start to evaluation start.
    pub epoch_duration_secs: u64,

    /// Length of the nomination period when the next epoch is scheduled.
    pub nomination_period_secs: u64,

    /// Length of the voting period when the next epoch is scheduled.
    pub voting_period_secs: u64,

    /// Schedules may never shrink nomination below this.
    pub min_nomination_period_secs: u64,

    /// Schedules may never shrink voting below this.
    pub min_voting_period_secs: u64,

    /// Schedules may never shrink the whole epoch below this.
    pub min_epoch_duration_secs: u64,

    /// How far a single boundary may move in one adjustment. 0 = unlimited.
    pub max_date_adjustment_tolerance_secs: u64,
}

impl ElectionSettings {
    /// Whether the settings are internally consistent.
    pub fn is_valid(&self) -> bool {
        self.epoch_seat_count > 0
            && self.nomination_period_secs >= self.min_nomination_period_secs
            && self.voting_period_secs >= self.min_voting_period_secs
            && self.min_nomination_period_secs > 0
            && self.min_voting_period_secs > 0
            && self.epoch_duration_secs >= self.min_epoch_duration_secs
            && self
                .nomination_period_secs
                .checked_add(self.voting_period_secs)
                .is_some_and(|periods| self.epoch_duration_secs > periods)
    }

    /// Lay out an epoch starting at `start` with these period lengths.
    ///
    /// Nomination and voting sit at the end of the epoch; the remainder is
    /// administration.
    pub fn schedule_from(&self, start: Timestamp) -> EpochSchedule {
        let evaluation_start = start.plus(self.epoch_duration_secs);
        let voting_start = Timestamp::new(
            evaluation_start
                .as_secs()
                .saturating_sub(self.voting_period_secs),
        );
        let nomination_start = Timestamp::new(
            voting_start
                .as_secs()
                .saturating_sub(self.nomination_period_secs),
        );
        EpochSchedule {
            administration_start: start,
            nomination_start,
            voting_start,
            evaluation_start,
        }
    }
}

impl Default for ElectionSettings {
    fn default() -> Self {
        Self {
            epoch_seat_count: 8,
            epoch_duration_secs: 90 * DAY,
            nomination_period_secs: 7 * DAY,
            voting_period_secs: 7 * DAY,
            min_nomination_period_secs: 2 * DAY,
            min_voting_period_secs: 2 * DAY,
            min_epoch_duration_secs: 7 * DAY,
            max_date_adjustment_tolerance_secs: 7 * DAY,
        }
    }
}
