//! Council lifecycle: setup, nominations, votes, evaluation and resolution.

use crate::clock::Clock;
use crate::engine::{require_admin, require_nonzero, require_period, GovernanceEngine};
use crate::error::GovernanceError;
use crate::provider::ProviderDirectory;
use crate::schedule::validate_schedule;
use council_store::{CastVoteRecord, ChangeSet, CouncilState, ElectionRecord, GovernanceStore, Tally};
use council_types::{
    Address, ChainId, ElectionId, ElectionSettings, EpochPeriod, EpochSchedule,
};
use std::collections::BTreeSet;

/// Sum the local tally with every relayed precinct tally.
pub fn aggregate_tally<'a>(local: &Tally, remotes: impl IntoIterator<Item = &'a Tally>) -> Tally {
    let mut total = local.clone();
    for tally in remotes {
        for (candidate, votes) in tally {
            let entry = total.entry(*candidate).or_insert(0);
            *entry = entry.saturating_add(*votes);
        }
    }
    total
}

/// The top `seats` candidates with non-zero votes, by votes descending and
/// then address ascending.
pub fn rank_winners(tally: &Tally, seats: u8) -> Vec<Address> {
    let mut ranked: Vec<(Address, u128)> = tally
        .iter()
        .filter(|(_, votes)| **votes > 0)
        .map(|(c, v)| (*c, *v))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(seats as usize)
        .map(|(c, _)| c)
        .collect()
}

fn invalid_ballot(reason: &str) -> GovernanceError {
    GovernanceError::InvalidBallot(reason.to_string())
}

impl<S, C, D> GovernanceEngine<S, C, D>
where
    S: GovernanceStore,
    C: Clock,
    D: ProviderDirectory,
{
    /// One-time setup of the council and the first election.
    pub fn initialize(
        &self,
        administrator: Address,
        local_chain: ChainId,
        settings: ElectionSettings,
        first_schedule: EpochSchedule,
    ) -> Result<(), GovernanceError> {
        if self.store().council()?.is_some() {
            return Err(GovernanceError::AlreadyInitialized);
        }
        require_nonzero(&administrator)?;
        if !settings.is_valid() {
            return Err(GovernanceError::InvalidElectionSettings);
        }
        validate_schedule(&settings, &first_schedule)?;

        let council = CouncilState {
            administrator,
            local_chain,
            current_election: ElectionId::FIRST,
            settings,
            council_members: Vec::new(),
        };
        let mut changes = ChangeSet::new();
        changes
            .put_council(council)
            .put_election(ElectionId::FIRST, ElectionRecord::new(first_schedule));
        self.commit(changes)?;

        tracing::info!(
            %administrator,
            chain = %local_chain,
            nomination_start = %first_schedule.nomination_start,
            "council initialized"
        );
        Ok(())
    }

    pub fn transfer_administration(
        &self,
        caller: &Address,
        new_administrator: Address,
    ) -> Result<(), GovernanceError> {
        let mut council = self.council()?;
        require_admin(&council, caller)?;
        require_nonzero(&new_administrator)?;
        if council.administrator == new_administrator {
            return Err(GovernanceError::NoChange);
        }
        council.administrator = new_administrator;
        let mut changes = ChangeSet::new();
        changes.put_council(council);
        self.commit(changes)?;
        tracing::info!(from = %caller, to = %new_administrator, "administration transferred");
        Ok(())
    }

    /// Replace the period lengths used for future epochs. Administration only.
    pub fn set_election_settings(
        &self,
        caller: &Address,
        settings: ElectionSettings,
    ) -> Result<(), GovernanceError> {
        let now = self.now();
        let (mut council, record) = self.current()?;
        require_admin(&council, caller)?;
        require_period(&record, EpochPeriod::Administration, now)?;
        if !settings.is_valid() {
            return Err(GovernanceError::InvalidElectionSettings);
        }
        if council.settings == settings {
            return Err(GovernanceError::NoChange);
        }
        council.settings = settings;
        let mut changes = ChangeSet::new();
        changes.put_council(council);
        self.commit(changes)?;
        tracing::info!(seats = settings.epoch_seat_count, "election settings updated");
        Ok(())
    }

    /// Register `candidate` for the election in progress.
    pub fn nominate(&self, candidate: &Address) -> Result<(), GovernanceError> {
        let now = self.now();
        let (council, mut record) = self.current()?;
        require_period(&record, EpochPeriod::Nomination, now)?;
        require_nonzero(candidate)?;
        if !record.nominees.insert(*candidate) {
            return Err(GovernanceError::AlreadyNominated(*candidate));
        }
        let mut changes = ChangeSet::new();
        changes.put_election(council.current_election, record);
        self.commit(changes)?;
        self.bump("nominations");
        tracing::info!(election = %council.current_election, %candidate, "candidate nominated");
        Ok(())
    }

    pub fn withdraw_nomination(&self, candidate: &Address) -> Result<(), GovernanceError> {
        let now = self.now();
        let (council, mut record) = self.current()?;
        require_period(&record, EpochPeriod::Nomination, now)?;
        if !record.nominees.remove(candidate) {
            return Err(GovernanceError::NotNominated(*candidate));
        }
        let mut changes = ChangeSet::new();
        changes.put_election(council.current_election, record);
        self.commit(changes)?;
        tracing::info!(election = %council.current_election, %candidate, "nomination withdrawn");
        Ok(())
    }

    /// Spend all of `voter`'s vote power across the listed candidates.
    ///
    /// The amounts must add up to exactly the voter's power over every
    /// precinct. A voter casts once per election.
    pub fn cast_vote(
        &self,
        voter: &Address,
        candidates: &[Address],
        amounts: &[u128],
    ) -> Result<(), GovernanceError> {
        let now = self.now();
        let (council, mut record) = self.current()?;
        require_period(&record, EpochPeriod::Voting, now)?;
        let election = council.current_election;
        if self.store().cast_vote(election, voter)?.is_some() {
            return Err(GovernanceError::VoteAlreadyCast(*voter));
        }

        if candidates.is_empty() {
            return Err(invalid_ballot("no candidates"));
        }
        if candidates.len() != amounts.len() {
            return Err(invalid_ballot("candidates and amounts differ in length"));
        }
        let distinct: BTreeSet<&Address> = candidates.iter().collect();
        if distinct.len() != candidates.len() {
            return Err(invalid_ballot("duplicate candidate"));
        }
        if let Some(c) = candidates.iter().find(|c| !record.nominees.contains(*c)) {
            return Err(GovernanceError::InvalidBallot(format!("{c} is not nominated")));
        }
        if amounts.iter().any(|a| *a == 0) {
            return Err(invalid_ballot("zero amount"));
        }

        let total_power = self.total_voting_power(election, voter)?;
        if total_power == 0 {
            return Err(GovernanceError::NoVotingPower(*voter));
        }
        let spent = amounts
            .iter()
            .try_fold(0u128, |acc, a| acc.checked_add(*a))
            .ok_or_else(|| invalid_ballot("amounts overflow"))?;
        if spent != total_power {
            return Err(GovernanceError::InvalidBallot(format!(
                "amounts sum to {spent}, voting power is {total_power}"
            )));
        }

        for (candidate, amount) in candidates.iter().zip(amounts) {
            let entry = record.local_tally.entry(*candidate).or_insert(0);
            *entry = entry.saturating_add(*amount);
        }
        let vote = CastVoteRecord {
            candidates: candidates.to_vec(),
            amounts: amounts.to_vec(),
            total_power,
        };
        let mut changes = ChangeSet::new();
        changes
            .put_cast_vote(election, *voter, vote)
            .put_election(election, record);
        self.commit(changes)?;
        self.bump("votes_cast");

        tracing::info!(%election, %voter, power = total_power, candidates = candidates.len(), "vote cast");
        Ok(())
    }

    /// Count every precinct's votes and pick the winners.
    pub fn evaluate(&self) -> Result<Vec<Address>, GovernanceError> {
        let now = self.now();
        let (council, mut record) = self.current()?;
        require_period(&record, EpochPeriod::Evaluation, now)?;
        if record.evaluated {
            return Err(GovernanceError::ElectionAlreadyEvaluated);
        }
        let election = council.current_election;
        let tally = self.election_tally(election)?;
        let winners = rank_winners(&tally, council.settings.epoch_seat_count);

        record.evaluated = true;
        record.winners = winners.clone();
        let mut changes = ChangeSet::new();
        changes.put_election(election, record);
        self.commit(changes)?;
        self.bump("elections_evaluated");

        tracing::info!(%election, winners = winners.len(), candidates = tally.len(), "election evaluated");
        Ok(winners)
    }

    /// Seat the winners and open the next epoch. Returns the new election id.
    pub fn resolve(&self) -> Result<ElectionId, GovernanceError> {
        let now = self.now();
        let (mut council, mut record) = self.current()?;
        require_period(&record, EpochPeriod::Evaluation, now)?;
        if !record.evaluated {
            return Err(GovernanceError::ElectionNotEvaluated);
        }

        let finished = council.current_election;
        let next = finished.next();
        let mut schedule = council.settings.schedule_from(record.schedule.evaluation_start);
        if schedule.nomination_start <= now {
            schedule = council.settings.schedule_from(now);
        }

        council.council_members = record.winners.clone();
        council.current_election = next;
        record.resolved = true;

        let mut changes = ChangeSet::new();
        changes
            .put_election(finished, record)
            .put_election(next, ElectionRecord::new(schedule))
            .put_council(council);
        self.commit(changes)?;
        self.bump("elections_resolved");

        tracing::info!(
            %finished,
            %next,
            nomination_start = %schedule.nomination_start,
            "epoch resolved"
        );
        Ok(next)
    }

    pub fn current_election_id(&self) -> Result<ElectionId, GovernanceError> {
        Ok(self.council()?.current_election)
    }

    pub fn council_members(&self) -> Result<Vec<Address>, GovernanceError> {
        Ok(self.council()?.council_members)
    }

    pub fn administrator(&self) -> Result<Address, GovernanceError> {
        Ok(self.council()?.administrator)
    }

    pub fn local_chain(&self) -> Result<ChainId, GovernanceError> {
        Ok(self.council()?.local_chain)
    }

    pub fn election_settings(&self) -> Result<ElectionSettings, GovernanceError> {
        Ok(self.council()?.settings)
    }

    pub fn nominees(&self, election: ElectionId) -> Result<Vec<Address>, GovernanceError> {
        Ok(self.election_record(election)?.nominees.into_iter().collect())
    }

    /// Local votes plus every relayed precinct tally.
    pub fn election_tally(&self, election: ElectionId) -> Result<Tally, GovernanceError> {
        let record = self.election_record(election)?;
        let remotes = self.store().remote_tallies(election)?;
        Ok(aggregate_tally(
            &record.local_tally,
            remotes.iter().map(|(_, t)| t),
        ))
    }

    pub fn election_winners(&self, election: ElectionId) -> Result<Vec<Address>, GovernanceError> {
        Ok(self.election_record(election)?.winners)
    }

    pub fn is_evaluated(&self, election: ElectionId) -> Result<bool, GovernanceError> {
        Ok(self.election_record(election)?.evaluated)
    }

    pub fn has_voted(&self, election: ElectionId, voter: &Address) -> Result<bool, GovernanceError> {
        Ok(self.store().cast_vote(election, voter)?.is_some())
    }
}
