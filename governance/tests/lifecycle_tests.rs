//! End-to-end election lifecycle on a single chain: schedule, providers,
//! snapshots, ballots, votes, evaluation and resolution.

mod common;

use common::*;
use council_governance::GovernanceError;
use council_store::{BallotStore, ElectionStore, SnapshotStore};
use council_types::{ElectionId, EpochPeriod, SnapshotId, Timestamp};

// ---------------------------------------------------------------------------
// Epoch schedule
// ---------------------------------------------------------------------------

#[test]
fn snapshot_waits_for_nomination_and_is_taken_once() {
    let engine = bare_engine();
    engine
        .initialize(admin(), LOCAL, settings(), schedule(500, 600, 700))
        .unwrap();
    let token_addr = addr(0x70);
    enable_token(&engine, token_addr);

    engine
        .set_epoch_schedule(&admin(), schedule(100, 200, 300))
        .unwrap();
    assert_eq!(engine.get_epoch_schedule().unwrap(), schedule(100, 200, 300));

    engine.clock().set(50);
    assert_wrong_period(
        engine.take_vote_power_snapshot(&token_addr),
        EpochPeriod::Administration,
    );

    engine.clock().set(150);
    let id = engine.take_vote_power_snapshot(&token_addr).unwrap();
    assert!(id.is_taken());
    assert_eq!(engine.get_vote_power_snapshot_id(&token_addr, E1).unwrap(), id);

    assert!(matches!(
        engine.take_vote_power_snapshot(&token_addr),
        Err(GovernanceError::SnapshotAlreadyTaken)
    ));
}

#[test]
fn current_period_follows_the_clock() {
    let engine = engine();
    for (t, period) in [
        (0, EpochPeriod::Administration),
        (IN_ADMINISTRATION, EpochPeriod::Administration),
        (NOMINATION_START, EpochPeriod::Nomination),
        (IN_NOMINATION, EpochPeriod::Nomination),
        (VOTING_START, EpochPeriod::Voting),
        (IN_VOTING, EpochPeriod::Voting),
        (EVALUATION_START, EpochPeriod::Evaluation),
        (100_000, EpochPeriod::Evaluation),
    ] {
        engine.clock().set(t);
        assert_eq!(engine.current_period().unwrap(), period, "at {t}");
    }
}

#[test]
fn schedule_changes_are_validated() {
    let engine = engine();
    engine.clock().set(IN_ADMINISTRATION);

    assert!(matches!(
        engine.set_epoch_schedule(&addr(1), schedule(120, 220, 320)),
        Err(GovernanceError::Unauthorized(a)) if a == addr(1)
    ));
    assert!(matches!(
        engine.set_epoch_schedule(&admin(), schedule(NOMINATION_START, VOTING_START, EVALUATION_START)),
        Err(GovernanceError::NoChange)
    ));
    // nomination already started
    assert!(matches!(
        engine.set_epoch_schedule(&admin(), schedule(40, 200, 300)),
        Err(GovernanceError::InvalidEpochSchedule(_))
    ));
    // voting shorter than the minimum
    assert!(matches!(
        engine.set_epoch_schedule(&admin(), schedule(100, 280, 300)),
        Err(GovernanceError::InvalidEpochSchedule(_))
    ));
    // out of order
    assert!(matches!(
        engine.set_epoch_schedule(&admin(), schedule(200, 100, 300)),
        Err(GovernanceError::InvalidEpochSchedule(_))
    ));

    assert_eq!(
        engine.get_epoch_schedule().unwrap(),
        schedule(NOMINATION_START, VOTING_START, EVALUATION_START)
    );
    assert_eq!(engine.stats().get("schedules_set"), 0);
}

#[test]
fn adjustment_tolerance_applies_when_set() {
    let engine = bare_engine();
    let tight = council_types::ElectionSettings {
        max_date_adjustment_tolerance_secs: 30,
        ..settings()
    };
    engine
        .initialize(admin(), LOCAL, tight, schedule(100, 200, 300))
        .unwrap();
    assert!(engine
        .set_epoch_schedule(&admin(), schedule(120, 220, 320))
        .is_ok());
    assert!(matches!(
        engine.set_epoch_schedule(&admin(), schedule(120, 220, 400)),
        Err(GovernanceError::InvalidEpochSchedule(_))
    ));
}

// ---------------------------------------------------------------------------
// Period gating
// ---------------------------------------------------------------------------

#[test]
fn every_mutation_is_gated_by_period() {
    let engine = engine();
    let token_addr = addr(0x70);
    enable_token(&engine, token_addr);
    let voter = addr(1);

    let outside = |t: u64, period: EpochPeriod| {
        engine.clock().set(t);
        period
    };

    for (t, current) in [
        (IN_NOMINATION, EpochPeriod::Nomination),
        (IN_VOTING, EpochPeriod::Voting),
        (IN_EVALUATION, EpochPeriod::Evaluation),
    ] {
        let p = outside(t, current);
        assert_wrong_period(engine.set_epoch_schedule(&admin(), schedule(1_000, 1_100, 1_200)), p);
        let mut changed = settings();
        changed.epoch_seat_count = 5;
        assert_wrong_period(engine.set_election_settings(&admin(), changed), p);
    }

    for (t, current) in [
        (IN_ADMINISTRATION, EpochPeriod::Administration),
        (IN_VOTING, EpochPeriod::Voting),
        (IN_EVALUATION, EpochPeriod::Evaluation),
    ] {
        let p = outside(t, current);
        assert_wrong_period(engine.take_vote_power_snapshot(&token_addr), p);
        assert_wrong_period(engine.nominate(&voter), p);
        assert_wrong_period(engine.withdraw_nomination(&voter), p);
        assert_wrong_period(engine.emit_nomination(&voter, REMOTE), p);
    }

    for (t, current) in [
        (IN_ADMINISTRATION, EpochPeriod::Administration),
        (IN_NOMINATION, EpochPeriod::Nomination),
        (IN_EVALUATION, EpochPeriod::Evaluation),
    ] {
        let p = outside(t, current);
        assert_wrong_period(engine.prepare_ballot_with_snapshot(&token_addr, &voter), p);
        assert_wrong_period(engine.cast_vote(&voter, &[addr(2)], &[1]), p);
        assert_wrong_period(engine.emit_ballot(&voter, REMOTE), p);
    }

    for (t, current) in [
        (IN_ADMINISTRATION, EpochPeriod::Administration),
        (IN_NOMINATION, EpochPeriod::Nomination),
        (IN_VOTING, EpochPeriod::Voting),
    ] {
        let p = outside(t, current);
        assert_wrong_period(engine.evaluate(), p);
        assert_wrong_period(engine.resolve(), p);
        assert_wrong_period(engine.emit_tally(REMOTE), p);
    }
    assert!(engine.outbound_since(0).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Providers and snapshots
// ---------------------------------------------------------------------------

#[test]
fn provider_registration_rules() {
    let engine = engine();
    let token_addr = addr(0x70);

    assert!(matches!(
        engine.set_snapshot_contract(&addr(1), token_addr, true),
        Err(GovernanceError::Unauthorized(_))
    ));
    assert!(matches!(
        engine.set_snapshot_contract(&admin(), council_types::Address::ZERO, true),
        Err(GovernanceError::ZeroAddress)
    ));
    assert!(matches!(
        engine.set_snapshot_contract(&admin(), token_addr, true),
        Err(GovernanceError::NotAContract(a)) if a == token_addr
    ));
    assert!(matches!(
        engine.set_snapshot_contract(&admin(), token_addr, false),
        Err(GovernanceError::NoChange)
    ));

    engine.directory().register_null(token_addr);
    engine
        .set_snapshot_contract(&admin(), token_addr, true)
        .unwrap();
    assert!(engine.is_enabled(&token_addr).unwrap());
    assert_eq!(engine.enabled_providers().unwrap(), vec![token_addr]);
    assert!(matches!(
        engine.set_snapshot_contract(&admin(), token_addr, true),
        Err(GovernanceError::NoChange)
    ));
}

#[test]
fn disabled_or_unknown_providers_cannot_snapshot() {
    let engine = engine();
    engine.clock().set(IN_NOMINATION);

    assert!(matches!(
        engine.take_vote_power_snapshot(&addr(0x71)),
        Err(GovernanceError::InvalidSnapshotContract)
    ));

    let token_addr = addr(0x70);
    enable_token(&engine, token_addr);
    engine
        .set_snapshot_contract(&admin(), token_addr, false)
        .unwrap();
    assert!(matches!(
        engine.take_vote_power_snapshot(&token_addr),
        Err(GovernanceError::InvalidSnapshotContract)
    ));
}

#[test]
fn disabling_after_snapshot_blocks_ballots_but_keeps_the_snapshot() {
    let engine = engine();
    let token_addr = addr(0x70);
    let voter = addr(1);
    snapshotted_token(&engine, token_addr, &[(voter, 100)]);
    let id = engine.get_vote_power_snapshot_id(&token_addr, E1).unwrap();

    engine
        .set_snapshot_contract(&admin(), token_addr, false)
        .unwrap();
    engine.clock().set(IN_VOTING);
    assert!(matches!(
        engine.prepare_ballot_with_snapshot(&token_addr, &voter),
        Err(GovernanceError::InvalidSnapshotContract)
    ));
    assert_eq!(engine.get_vote_power_snapshot_id(&token_addr, E1).unwrap(), id);
}

#[test]
fn bad_checkpoints_are_not_stored() {
    let engine = engine();
    let token_addr = addr(0x70);
    let token = enable_token(&engine, token_addr);
    engine.clock().set(IN_NOMINATION);

    token.set_empty_checkpoints(true);
    assert!(matches!(
        engine.take_vote_power_snapshot(&token_addr),
        Err(GovernanceError::InvalidSnapshotContract)
    ));
    token.set_empty_checkpoints(false);

    token.set_failing(true);
    assert!(matches!(
        engine.take_vote_power_snapshot(&token_addr),
        Err(GovernanceError::Provider(_))
    ));
    assert_eq!(
        engine.store().snapshot_id(E1, &token_addr).unwrap(),
        SnapshotId::NONE
    );

    token.set_failing(false);
    assert_eq!(engine.take_vote_power_snapshot(&token_addr).unwrap(), SnapshotId(1));
}

#[test]
fn snapshot_without_directory_entry_is_invalid() {
    let engine = engine();
    let token_addr = addr(0x70);
    enable_token(&engine, token_addr);
    engine.directory().unregister(&token_addr);
    engine.clock().set(IN_NOMINATION);
    assert!(matches!(
        engine.take_vote_power_snapshot(&token_addr),
        Err(GovernanceError::InvalidSnapshotContract)
    ));
}

// ---------------------------------------------------------------------------
// Ballots
// ---------------------------------------------------------------------------

#[test]
fn ballot_power_is_the_checkpoint_balance() {
    let engine = engine();
    let token_addr = addr(0x70);
    let voter = addr(1);
    let token = snapshotted_token(&engine, token_addr, &[(voter, 100)]);
    // balance moves after the snapshot; the ballot must not see it
    token.set_balance(voter, 7);

    engine.clock().set(IN_VOTING);
    assert_eq!(
        engine.prepare_ballot_with_snapshot(&token_addr, &voter).unwrap(),
        100
    );
    assert_eq!(engine.ballot_voting_power(E1, &voter, LOCAL).unwrap(), 100);
    assert_eq!(engine.ballot_voting_power(E1, &voter, REMOTE).unwrap(), 0);
    assert_eq!(engine.total_voting_power(E1, &voter).unwrap(), 100);
}

#[test]
fn preparing_twice_changes_nothing() {
    let engine = engine();
    let token_addr = addr(0x70);
    let voter = addr(1);
    snapshotted_token(&engine, token_addr, &[(voter, 250)]);
    engine.clock().set(IN_VOTING);

    let first = engine.prepare_ballot_with_snapshot(&token_addr, &voter).unwrap();
    let stored = engine.store().ballot(E1, &voter, LOCAL).unwrap();
    let second = engine.prepare_ballot_with_snapshot(&token_addr, &voter).unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.store().ballot(E1, &voter, LOCAL).unwrap(), stored);
    assert_eq!(engine.ballot_voting_power(E1, &voter, LOCAL).unwrap(), 250);
}

#[test]
fn ballots_sum_every_enabled_provider() {
    let engine = engine();
    let voter = addr(1);
    snapshotted_token(&engine, addr(0x70), &[(voter, 30)]);
    let second = enable_token(&engine, addr(0x71));
    second.set_balance(voter, 12);
    engine.take_vote_power_snapshot(&addr(0x71)).unwrap();

    engine.clock().set(IN_VOTING);
    engine.prepare_ballot_with_snapshot(&addr(0x70), &voter).unwrap();
    engine.prepare_ballot_with_snapshot(&addr(0x71), &voter).unwrap();
    assert_eq!(engine.ballot_voting_power(E1, &voter, LOCAL).unwrap(), 42);
}

#[test]
fn ballot_needs_a_snapshot() {
    let engine = engine();
    let token_addr = addr(0x70);
    enable_token(&engine, token_addr);
    engine.clock().set(IN_VOTING);
    assert!(matches!(
        engine.prepare_ballot_with_snapshot(&token_addr, &addr(1)),
        Err(GovernanceError::InvalidSnapshotContract)
    ));
}

// ---------------------------------------------------------------------------
// Council lifecycle
// ---------------------------------------------------------------------------

#[test]
fn initialize_only_once() {
    let engine = engine();
    assert!(matches!(
        engine.initialize(admin(), LOCAL, settings(), schedule(100, 200, 300)),
        Err(GovernanceError::AlreadyInitialized)
    ));

    let fresh = bare_engine();
    assert!(matches!(
        fresh.current_election_id(),
        Err(GovernanceError::NotInitialized)
    ));
    let mut broken = settings();
    broken.epoch_seat_count = 0;
    assert!(matches!(
        fresh.initialize(admin(), LOCAL, broken, schedule(100, 200, 300)),
        Err(GovernanceError::InvalidElectionSettings)
    ));
    assert!(!fresh.is_initialized().unwrap());
}

#[test]
fn administration_can_be_handed_over() {
    let engine = engine();
    let next = addr(0xBB);
    assert!(matches!(
        engine.transfer_administration(&admin(), admin()),
        Err(GovernanceError::NoChange)
    ));
    engine.transfer_administration(&admin(), next).unwrap();
    assert_eq!(engine.administrator().unwrap(), next);
    assert!(matches!(
        engine.set_snapshot_contract(&admin(), addr(0x70), true),
        Err(GovernanceError::Unauthorized(_))
    ));
}

#[test]
fn full_election_seats_the_winners() {
    let engine = engine();
    let token_addr = addr(0x70);
    let (alice, bob, carol) = (addr(1), addr(2), addr(3));
    let (v1, v2, v3) = (addr(0x11), addr(0x12), addr(0x13));
    snapshotted_token(&engine, token_addr, &[(v1, 100), (v2, 60), (v3, 30)]);

    engine.nominate(&alice).unwrap();
    engine.nominate(&bob).unwrap();
    engine.nominate(&carol).unwrap();
    assert!(matches!(
        engine.nominate(&alice),
        Err(GovernanceError::AlreadyNominated(_))
    ));
    engine.withdraw_nomination(&carol).unwrap();
    assert!(matches!(
        engine.withdraw_nomination(&carol),
        Err(GovernanceError::NotNominated(_))
    ));
    assert_eq!(engine.nominees(E1).unwrap(), vec![alice, bob]);

    engine.clock().set(IN_VOTING);
    for voter in [v1, v2, v3] {
        engine.prepare_ballot_with_snapshot(&token_addr, &voter).unwrap();
    }

    assert!(matches!(
        engine.cast_vote(&v1, &[alice], &[99]),
        Err(GovernanceError::InvalidBallot(_))
    ));
    assert!(matches!(
        engine.cast_vote(&v1, &[carol], &[100]),
        Err(GovernanceError::InvalidBallot(_))
    ));
    assert!(matches!(
        engine.cast_vote(&v1, &[alice, alice], &[50, 50]),
        Err(GovernanceError::InvalidBallot(_))
    ));
    assert!(matches!(
        engine.cast_vote(&v1, &[alice, bob], &[100, 0]),
        Err(GovernanceError::InvalidBallot(_))
    ));
    assert!(matches!(
        engine.cast_vote(&addr(0x19), &[alice], &[1]),
        Err(GovernanceError::NoVotingPower(_))
    ));

    engine.cast_vote(&v1, &[alice, bob], &[40, 60]).unwrap();
    engine.cast_vote(&v2, &[bob], &[60]).unwrap();
    engine.cast_vote(&v3, &[alice], &[30]).unwrap();
    assert!(matches!(
        engine.cast_vote(&v1, &[alice], &[100]),
        Err(GovernanceError::VoteAlreadyCast(_))
    ));
    assert!(matches!(
        engine.prepare_ballot_with_snapshot(&token_addr, &v1),
        Err(GovernanceError::VoteAlreadyCast(_))
    ));
    assert!(engine.has_voted(E1, &v1).unwrap());

    engine.clock().set(IN_EVALUATION);
    assert!(matches!(engine.resolve(), Err(GovernanceError::ElectionNotEvaluated)));
    assert_eq!(engine.evaluate().unwrap(), vec![bob, alice]);
    assert!(matches!(
        engine.evaluate(),
        Err(GovernanceError::ElectionAlreadyEvaluated)
    ));
    let tally = engine.election_tally(E1).unwrap();
    assert_eq!(tally.get(&alice), Some(&70));
    assert_eq!(tally.get(&bob), Some(&120));

    let next = engine.resolve().unwrap();
    assert_eq!(next, ElectionId(2));
    assert_eq!(engine.current_election_id().unwrap(), next);
    assert_eq!(engine.council_members().unwrap(), vec![bob, alice]);
    assert!(engine.store().election(E1).unwrap().unwrap().resolved);

    // the next epoch starts where evaluation began and is back in administration
    let schedule = engine.get_epoch_schedule().unwrap();
    assert_eq!(schedule.administration_start, Timestamp::new(EVALUATION_START));
    assert_eq!(engine.current_period().unwrap(), EpochPeriod::Administration);

    // snapshots are per election
    assert_eq!(
        engine.get_vote_power_snapshot_id(&token_addr, next).unwrap(),
        SnapshotId::NONE
    );
}

#[test]
fn late_resolution_schedules_from_now() {
    let engine = engine();
    engine.clock().set(50_000);
    engine.evaluate().unwrap();
    engine.resolve().unwrap();
    let schedule = engine.get_epoch_schedule().unwrap();
    assert_eq!(schedule.administration_start, Timestamp::new(50_000));
    assert!(schedule.nomination_start > Timestamp::new(50_000));
    assert!(engine.council_members().unwrap().is_empty());
}

#[test]
fn settings_apply_to_the_next_epoch() {
    let engine = engine();
    let mut wider = settings();
    wider.epoch_duration_secs = 5_000;
    assert!(matches!(
        engine.set_election_settings(&admin(), settings()),
        Err(GovernanceError::NoChange)
    ));
    let mut invalid = settings();
    invalid.voting_period_secs = 10;
    assert!(matches!(
        engine.set_election_settings(&admin(), invalid),
        Err(GovernanceError::InvalidElectionSettings)
    ));
    engine.set_election_settings(&admin(), wider).unwrap();

    engine.clock().set(IN_EVALUATION);
    engine.evaluate().unwrap();
    engine.resolve().unwrap();
    assert_eq!(
        engine.get_epoch_schedule().unwrap().evaluation_start,
        Timestamp::new(EVALUATION_START + 5_000)
    );
}

#[test]
fn failed_commit_leaves_state_untouched() {
    let engine = engine();
    let token_addr = addr(0x70);
    let voter = addr(1);
    snapshotted_token(&engine, token_addr, &[(voter, 100)]);
    engine.nominate(&addr(2)).unwrap();
    engine.clock().set(IN_VOTING);
    engine.prepare_ballot_with_snapshot(&token_addr, &voter).unwrap();

    engine.store().set_fail_commits(true);
    assert!(matches!(
        engine.cast_vote(&voter, &[addr(2)], &[100]),
        Err(GovernanceError::Store(_))
    ));
    engine.store().set_fail_commits(false);

    assert!(!engine.has_voted(E1, &voter).unwrap());
    assert!(engine.election_tally(E1).unwrap().is_empty());
    engine.cast_vote(&voter, &[addr(2)], &[100]).unwrap();
}
