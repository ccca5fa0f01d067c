//! Epoch scheduler: the four-period calendar of the election in progress.

use crate::clock::Clock;
use crate::engine::{require_admin, require_period, GovernanceEngine};
use crate::error::GovernanceError;
use crate::provider::ProviderDirectory;
use council_store::{ChangeSet, GovernanceStore};
use council_types::{Address, ElectionSettings, EpochPeriod, EpochSchedule};

/// Check a schedule against the period minimums in `settings`.
pub fn validate_schedule(
    settings: &ElectionSettings,
    schedule: &EpochSchedule,
) -> Result<(), GovernanceError> {
    if !schedule.is_monotonic() {
        return Err(GovernanceError::InvalidEpochSchedule(
            "boundaries must be increasing".into(),
        ));
    }
    if schedule.nomination_duration() < settings.min_nomination_period_secs {
        return Err(GovernanceError::InvalidEpochSchedule(format!(
            "nomination period {}s is shorter than {}s",
            schedule.nomination_duration(),
            settings.min_nomination_period_secs
        )));
    }
    if schedule.voting_duration() < settings.min_voting_period_secs {
        return Err(GovernanceError::InvalidEpochSchedule(format!(
            "voting period {}s is shorter than {}s",
            schedule.voting_duration(),
            settings.min_voting_period_secs
        )));
    }
    if schedule.epoch_duration() < settings.min_epoch_duration_secs {
        return Err(GovernanceError::InvalidEpochSchedule(format!(
            "epoch {}s is shorter than {}s",
            schedule.epoch_duration(),
            settings.min_epoch_duration_secs
        )));
    }
    Ok(())
}

/// Check an adjustment of `previous` to `next` against the tolerance.
pub fn validate_adjustment(
    settings: &ElectionSettings,
    previous: &EpochSchedule,
    next: &EpochSchedule,
) -> Result<(), GovernanceError> {
    let tolerance = settings.max_date_adjustment_tolerance_secs;
    let shift = previous.max_boundary_shift(next);
    if tolerance > 0 && shift > tolerance {
        return Err(GovernanceError::InvalidEpochSchedule(format!(
            "boundary moved {shift}s, tolerance is {tolerance}s"
        )));
    }
    Ok(())
}

impl<S, C, D> GovernanceEngine<S, C, D>
where
    S: GovernanceStore,
    C: Clock,
    D: ProviderDirectory,
{
    /// Boundaries of the election in progress.
    pub fn get_epoch_schedule(&self) -> Result<EpochSchedule, GovernanceError> {
        Ok(self.current()?.1.schedule)
    }

    /// The period in effect right now.
    pub fn current_period(&self) -> Result<EpochPeriod, GovernanceError> {
        let (_, record) = self.current()?;
        Ok(record.schedule.period_at(self.now()))
    }

    /// Replace the boundaries of the election in progress.
    ///
    /// Administrator only, and only while the epoch is still in
    /// Administration.
    pub fn set_epoch_schedule(
        &self,
        caller: &Address,
        schedule: EpochSchedule,
    ) -> Result<(), GovernanceError> {
        let now = self.now();
        let (council, mut record) = self.current()?;
        require_admin(&council, caller)?;
        require_period(&record, EpochPeriod::Administration, now)?;

        if record.schedule == schedule {
            return Err(GovernanceError::NoChange);
        }
        validate_schedule(&council.settings, &schedule)?;
        if schedule.nomination_start <= now {
            return Err(GovernanceError::InvalidEpochSchedule(
                "nomination start is in the past".into(),
            ));
        }
        validate_adjustment(&council.settings, &record.schedule, &schedule)?;

        let previous = record.schedule;
        record.schedule = schedule;
        let mut changes = ChangeSet::new();
        changes.put_election(council.current_election, record);
        self.commit(changes)?;
        self.bump("schedules_set");

        tracing::info!(
            election = %council.current_election,
            nomination_start = %schedule.nomination_start,
            voting_start = %schedule.voting_start,
            evaluation_start = %schedule.evaluation_start,
            shift = previous.max_boundary_shift(&schedule),
            "epoch schedule updated"
        );
        Ok(())
    }
}
