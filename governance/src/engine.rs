//! The governance engine: one deployment's view of the council election.
//!
//! Each component (scheduler, registry, snapshotter, ballots, council
//! lifecycle, relay) adds its operations to [`GovernanceEngine`] from its own
//! module. Every mutating operation validates first, gathers its writes into
//! a [`ChangeSet`], and commits once.

use crate::clock::Clock;
use crate::error::GovernanceError;
use crate::provider::ProviderDirectory;
use council_store::{ChangeSet, CouncilState, ElectionRecord, GovernanceStore};
use council_types::{Address, ElectionId, EpochPeriod, Timestamp};
use council_utils::StatsCounter;

pub(crate) const STAT_NAMES: &[&str] = &[
    "schedules_set",
    "providers_updated",
    "snapshots_taken",
    "ballots_prepared",
    "nominations",
    "votes_cast",
    "elections_evaluated",
    "elections_resolved",
    "messages_received",
    "messages_rejected",
    "messages_emitted",
];

pub struct GovernanceEngine<S, C, D> {
    store: S,
    clock: C,
    directory: D,
    stats: StatsCounter,
}

impl<S, C, D> GovernanceEngine<S, C, D>
where
    S: GovernanceStore,
    C: Clock,
    D: ProviderDirectory,
{
    pub fn new(store: S, clock: C, directory: D) -> Self {
        Self {
            store,
            clock,
            directory,
            stats: StatsCounter::new(STAT_NAMES),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn is_initialized(&self) -> Result<bool, GovernanceError> {
        Ok(self.store.council()?.is_some())
    }

    pub(crate) fn council(&self) -> Result<CouncilState, GovernanceError> {
        self.store.council()?.ok_or(GovernanceError::NotInitialized)
    }

    pub(crate) fn election_record(&self, id: ElectionId) -> Result<ElectionRecord, GovernanceError> {
        self.store
            .election(id)?
            .ok_or_else(|| council_store::StoreError::NotFound(format!("election {id}")).into())
    }

    /// The council and the record of the election in progress.
    pub(crate) fn current(&self) -> Result<(CouncilState, ElectionRecord), GovernanceError> {
        let council = self.council()?;
        let record = self.election_record(council.current_election)?;
        Ok((council, record))
    }

    pub(crate) fn commit(&self, changes: ChangeSet) -> Result<(), GovernanceError> {
        self.store.commit(changes)?;
        Ok(())
    }

    pub(crate) fn bump(&self, stat: &str) {
        self.stats.increment(stat);
    }
}

pub(crate) fn require_period(
    record: &ElectionRecord,
    expected: EpochPeriod,
    now: Timestamp,
) -> Result<(), GovernanceError> {
    let current = record.schedule.period_at(now);
    if current == expected {
        Ok(())
    } else {
        Err(GovernanceError::NotCallableInCurrentPeriod { current })
    }
}

pub(crate) fn require_admin(council: &CouncilState, caller: &Address) -> Result<(), GovernanceError> {
    if council.administrator == *caller {
        Ok(())
    } else {
        Err(GovernanceError::Unauthorized(*caller))
    }
}

pub(crate) fn require_nonzero(address: &Address) -> Result<(), GovernanceError> {
    if address.is_zero() {
        Err(GovernanceError::ZeroAddress)
    } else {
        Ok(())
    }
}
