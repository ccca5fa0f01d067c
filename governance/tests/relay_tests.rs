//! Cross-chain relay between two in-process precincts.

mod common;

use common::*;
use council_governance::GovernanceError;
use council_messages::{message_hash, Envelope, GovernancePayload};
use council_nullables::{guardian_keys, public_keys, NullTransport};
use council_store::{ChangeSet, ElectionStore, GovernanceStore, OutboundRecord, RelayStore};
use council_types::{ChainId, ElectionId, EpochPeriod, MessageHash, Timestamp};

/// Local and remote engines that trust each other's three guardians with a
/// quorum of two.
fn precincts() -> (TestEngine, TestEngine) {
    let local = engine_on(LOCAL);
    let remote = engine_on(REMOTE);
    trust(&local, REMOTE, 3, 2);
    trust(&remote, LOCAL, 3, 2);
    (local, remote)
}

fn transport() -> NullTransport {
    NullTransport::with_guardians(guardian_keys(3))
}

/// Prepare `power` for `voter` on `remote` and emit it towards LOCAL.
fn remote_ballot(remote: &TestEngine, voter: council_types::Address, power: u128) {
    snapshotted_token(remote, addr(0x70), &[(voter, power)]);
    remote.clock().set(IN_VOTING);
    remote.prepare_ballot_with_snapshot(&addr(0x70), &voter).unwrap();
    remote.emit_ballot(&voter, LOCAL).unwrap();
}

#[test]
fn duplicate_delivery_is_applied_once() {
    let (local, remote) = precincts();
    let voter = addr(1);
    remote_ballot(&remote, voter, 100);
    local.clock().set(IN_VOTING);

    let transport = transport();
    let envelopes = transport.collect(&remote).unwrap();
    assert_eq!(envelopes.len(), 1);

    let first = transport.deliver(&local, &envelopes);
    let hash = *first[0].as_ref().unwrap();
    assert_eq!(hash, envelopes[0].hash());
    assert!(local.is_consumed(&hash).unwrap());
    assert_eq!(local.ballot_voting_power(E1, &voter, REMOTE).unwrap(), 100);

    let second = transport.deliver(&local, &envelopes);
    assert!(matches!(
        second[0],
        Err(GovernanceError::MessageAlreadyConsumed(h)) if h == hash
    ));
    assert_eq!(local.ballot_voting_power(E1, &voter, REMOTE).unwrap(), 100);
    assert_eq!(local.total_voting_power(E1, &voter).unwrap(), 100);
    assert_eq!(local.stats().get("messages_received"), 1);
    assert_eq!(local.stats().get("messages_rejected"), 1);
}

#[test]
fn relayed_power_can_be_voted_with() {
    let (local, remote) = precincts();
    let voter = addr(1);
    let candidate = addr(9);
    local.clock().set(IN_NOMINATION);
    local.nominate(&candidate).unwrap();
    remote_ballot(&remote, voter, 100);
    local.clock().set(IN_VOTING);
    transport().relay(&remote, &local).unwrap();

    local.cast_vote(&voter, &[candidate], &[100]).unwrap();
    local.clock().set(IN_EVALUATION);
    assert_eq!(local.evaluate().unwrap(), vec![candidate]);
}

#[test]
fn too_few_signatures_leave_the_message_resubmittable() {
    let (local, remote) = precincts();
    remote_ballot(&remote, addr(1), 100);
    local.clock().set(IN_VOTING);

    let keys = guardian_keys(3);
    let unsigned = remote.outbound_envelopes(0).unwrap().remove(0);

    let one = unsigned.clone().signed_by(0, &keys[0].private);
    assert!(matches!(
        local.receive_message(&one),
        Err(GovernanceError::InvalidSignature { origin, valid: 1, required: 2 }) if origin == REMOTE
    ));
    // the same guardian twice still counts once
    let repeated = one.clone().signed_by(0, &keys[0].private);
    assert!(matches!(
        local.receive_message(&repeated),
        Err(GovernanceError::InvalidSignature { valid: 1, .. })
    ));
    // a key outside the set counts for nothing
    let stranger = council_crypto::keypair_from_seed(&[0x55; 32]);
    let foreign = one.clone().signed_by(1, &stranger.private);
    assert!(matches!(
        local.receive_message(&foreign),
        Err(GovernanceError::InvalidSignature { valid: 1, .. })
    ));
    assert!(!local.is_consumed(&unsigned.hash()).unwrap());
    assert_eq!(local.ballot_voting_power(E1, &addr(1), REMOTE).unwrap(), 0);

    let two = one.signed_by(2, &keys[2].private);
    assert!(local.receive_message(&two).is_ok());
    assert!(local.is_consumed(&unsigned.hash()).unwrap());
}

#[test]
fn unknown_origin_is_rejected() {
    let local = engine();
    let remote = engine_on(ChainId(3));
    trust(&remote, LOCAL, 3, 2);
    remote_ballot(&remote, addr(1), 5);
    local.clock().set(IN_VOTING);

    let results = transport().relay(&remote, &local).unwrap();
    assert!(matches!(
        results[0],
        Err(GovernanceError::InvalidSignature { valid: 0, required: 0, .. })
    ));
}

#[test]
fn tampered_payload_breaks_signatures() {
    let (local, remote) = precincts();
    remote_ballot(&remote, addr(1), 100);
    local.clock().set(IN_VOTING);

    let mut envelope = transport().collect(&remote).unwrap().remove(0);
    let forged = GovernancePayload::BallotPower {
        election: E1,
        voter: addr(1),
        contributions: vec![(addr(0x70), 1_000_000)],
    };
    envelope.payload = forged.encode().unwrap();
    assert!(matches!(
        local.receive_message(&envelope),
        Err(GovernanceError::InvalidSignature { valid: 0, .. })
    ));
}

#[test]
fn early_messages_are_not_consumed() {
    let (local, remote) = precincts();
    remote_ballot(&remote, addr(1), 100);
    let envelopes = transport().collect(&remote).unwrap();

    local.clock().set(IN_NOMINATION);
    let transport = transport();
    assert_wrong_period(
        transport.deliver(&local, &envelopes).remove(0),
        EpochPeriod::Nomination,
    );
    assert!(!local.is_consumed(&envelopes[0].hash()).unwrap());

    local.clock().set(IN_VOTING);
    assert!(transport.deliver(&local, &envelopes)[0].is_ok());
}

#[test]
fn messages_for_another_election_are_rejected() {
    let (local, _remote) = precincts();
    local.clock().set(IN_NOMINATION);
    let keys = guardian_keys(3);
    let envelope = Envelope::from_payload(
        REMOTE,
        1,
        &GovernancePayload::NominationAnnounced {
            election: ElectionId(7),
            candidate: addr(3),
        },
    )
    .unwrap()
    .signed_by(0, &keys[0].private)
    .signed_by(1, &keys[1].private);

    assert!(matches!(
        local.receive_message(&envelope),
        Err(GovernanceError::ElectionMismatch { expected, found })
            if expected == E1 && found == ElectionId(7)
    ));
    assert!(!local.is_consumed(&envelope.hash()).unwrap());
}

#[test]
fn malformed_payload_is_rejected_after_verification() {
    let (local, _remote) = precincts();
    let keys = guardian_keys(3);
    let envelope = Envelope::new(REMOTE, 1, vec![9, 9, 9])
        .signed_by(0, &keys[0].private)
        .signed_by(1, &keys[1].private);
    assert!(matches!(
        local.receive_message(&envelope),
        Err(GovernanceError::InvalidPayload(_))
    ));
    assert!(!local.is_consumed(&envelope.hash()).unwrap());
}

#[test]
fn nominations_reach_other_precincts() {
    let (local, remote) = precincts();
    let candidate = addr(3);
    remote.clock().set(IN_NOMINATION);
    local.clock().set(IN_NOMINATION);
    remote.nominate(&candidate).unwrap();
    assert!(matches!(
        remote.emit_nomination(&addr(4), LOCAL),
        Err(GovernanceError::NotNominated(_))
    ));
    remote.emit_nomination(&candidate, LOCAL).unwrap();

    let results = transport().relay(&remote, &local).unwrap();
    assert!(results[0].is_ok());
    assert_eq!(local.nominees(E1).unwrap(), vec![candidate]);
}

#[test]
fn remote_tallies_count_at_evaluation() {
    let (local, remote) = precincts();
    let (alice, bob) = (addr(1), addr(2));
    let (v_local, v_remote) = (addr(0x11), addr(0x12));

    for engine in [&local, &remote] {
        snapshotted_token(engine, addr(0x70), &[(v_local, 50), (v_remote, 80)]);
        engine.nominate(&alice).unwrap();
        engine.nominate(&bob).unwrap();
        engine.clock().set(IN_VOTING);
    }
    local.prepare_ballot_with_snapshot(&addr(0x70), &v_local).unwrap();
    local.cast_vote(&v_local, &[alice], &[50]).unwrap();
    remote.prepare_ballot_with_snapshot(&addr(0x70), &v_remote).unwrap();
    remote.cast_vote(&v_remote, &[bob], &[80]).unwrap();

    remote.clock().set(IN_EVALUATION);
    local.clock().set(IN_EVALUATION);
    remote.emit_tally(LOCAL).unwrap();
    let results = transport().relay(&remote, &local).unwrap();
    assert!(results[0].is_ok());
    assert_eq!(local.store().remote_tallies(E1).unwrap().len(), 1);

    assert_eq!(local.evaluate().unwrap(), vec![bob, alice]);
    assert_eq!(local.election_tally(E1).unwrap().get(&bob), Some(&80));

    // tallies arriving after evaluation are refused
    remote.emit_tally(LOCAL).unwrap();
    let late = transport().relay(&remote, &local).unwrap();
    assert!(late
        .iter()
        .any(|r| matches!(r, Err(GovernanceError::ElectionAlreadyEvaluated))));
}

#[test]
fn exported_power_is_tallied_only_where_it_was_sent() {
    let (local, remote) = precincts();
    let voter = addr(1);
    let candidate = addr(9);
    snapshotted_token(&local, addr(0x70), &[(voter, 100)]);
    remote.clock().set(IN_NOMINATION);
    for engine in [&local, &remote] {
        engine.nominate(&candidate).unwrap();
    }

    local.clock().set(IN_VOTING);
    local.prepare_ballot_with_snapshot(&addr(0x70), &voter).unwrap();
    local.emit_ballot(&voter, REMOTE).unwrap();

    assert_eq!(local.ballot_voting_power(E1, &voter, LOCAL).unwrap(), 100);
    assert_eq!(local.total_voting_power(E1, &voter).unwrap(), 0);
    assert!(matches!(
        local.cast_vote(&voter, &[candidate], &[100]),
        Err(GovernanceError::NoVotingPower(_))
    ));
    assert!(matches!(
        local.prepare_ballot_with_snapshot(&addr(0x70), &voter),
        Err(GovernanceError::BallotExported { destination, .. }) if destination == REMOTE
    ));
    assert!(matches!(
        local.emit_ballot(&voter, ChainId(3)),
        Err(GovernanceError::BallotExported { destination, .. }) if destination == REMOTE
    ));
    assert_eq!(local.outbound_since(0).unwrap().len(), 1);

    remote.clock().set(IN_VOTING);
    assert!(transport().relay(&local, &remote).unwrap()[0].is_ok());
    remote.cast_vote(&voter, &[candidate], &[100]).unwrap();

    remote.clock().set(IN_EVALUATION);
    local.clock().set(IN_EVALUATION);
    remote.emit_tally(LOCAL).unwrap();
    assert!(transport().relay(&remote, &local).unwrap()[0].is_ok());

    assert_eq!(local.evaluate().unwrap(), vec![candidate]);
    assert_eq!(local.election_tally(E1).unwrap().get(&candidate), Some(&100));
}

#[test]
fn one_sequence_is_applied_once_whatever_its_payload() {
    let (local, _remote) = precincts();
    local.clock().set(IN_NOMINATION);
    let keys = guardian_keys(3);
    let announce = |sequence: u64, candidate| {
        Envelope::from_payload(
            REMOTE,
            sequence,
            &GovernancePayload::NominationAnnounced {
                election: E1,
                candidate,
            },
        )
        .unwrap()
        .signed_by(0, &keys[0].private)
        .signed_by(1, &keys[1].private)
    };

    let first = announce(7, addr(3));
    let rival = announce(7, addr(4));
    assert_ne!(first.hash(), rival.hash());

    let applied = local.receive_message(&first).unwrap();
    assert!(matches!(
        local.receive_message(&rival),
        Err(GovernanceError::SequenceAlreadyConsumed { origin, sequence: 7, consumed_by })
            if origin == REMOTE && consumed_by == applied
    ));
    assert!(!local.is_consumed(&rival.hash()).unwrap());
    assert_eq!(local.nominees(E1).unwrap(), vec![addr(3)]);

    assert!(local.receive_message(&announce(8, addr(4))).is_ok());
    assert_eq!(local.nominees(E1).unwrap(), vec![addr(3), addr(4)]);
}

#[test]
fn ballot_power_after_a_cast_vote_is_refused() {
    let (local, remote) = precincts();
    let voter = addr(1);
    snapshotted_token(&local, addr(0x70), &[(voter, 10)]);
    local.nominate(&addr(9)).unwrap();
    local.clock().set(IN_VOTING);
    local.prepare_ballot_with_snapshot(&addr(0x70), &voter).unwrap();
    local.cast_vote(&voter, &[addr(9)], &[10]).unwrap();

    remote_ballot(&remote, voter, 100);
    let results = transport().relay(&remote, &local).unwrap();
    assert!(matches!(results[0], Err(GovernanceError::VoteAlreadyCast(_))));
    assert_eq!(local.ballot_voting_power(E1, &voter, REMOTE).unwrap(), 0);
}

#[test]
fn outbox_sequences_increase_from_one() {
    let (_local, remote) = precincts();
    remote.clock().set(IN_NOMINATION);
    for candidate in [addr(1), addr(2), addr(3)] {
        remote.nominate(&candidate).unwrap();
        remote.emit_nomination(&candidate, LOCAL).unwrap();
    }
    let all = remote.outbound_since(0).unwrap();
    assert_eq!(all.iter().map(|r| r.sequence).collect::<Vec<_>>(), vec![1, 2, 3]);
    for record in &all {
        assert_eq!(record.destination, LOCAL);
        assert_eq!(record.hash, message_hash(REMOTE, record.sequence, &record.payload));
    }
    assert_eq!(remote.outbound_since(1).unwrap().len(), 2);
    assert_eq!(remote.store().last_outbound_sequence().unwrap(), Some(3));

    let envelopes = remote.outbound_envelopes(2).unwrap();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].hash(), all[2].hash);
}

#[test]
fn exhausted_outbox_refuses_to_wrap() {
    let local = engine();
    let mut changes = ChangeSet::new();
    changes.append_outbound(OutboundRecord {
        sequence: u64::MAX,
        destination: REMOTE,
        payload: vec![],
        hash: MessageHash::ZERO,
        emitted_at: Timestamp::new(0),
    });
    local.store().commit(changes).unwrap();

    let payload = GovernancePayload::Tally {
        election: E1,
        votes: vec![],
    };
    assert!(matches!(
        local.emit(REMOTE, &payload),
        Err(GovernanceError::OutboxExhausted)
    ));
    assert_eq!(local.outbound_since(0).unwrap().len(), 1);
}

#[test]
fn emitting_a_ballot_needs_power() {
    let (_local, remote) = precincts();
    snapshotted_token(&remote, addr(0x70), &[]);
    remote.clock().set(IN_VOTING);
    assert!(matches!(
        remote.emit_ballot(&addr(1), LOCAL),
        Err(GovernanceError::NoVotingPower(_))
    ));
}

#[test]
fn guardian_set_rules() {
    let local = engine();
    let keys = public_keys(&guardian_keys(3));

    assert!(matches!(
        local.set_guardian_set(&addr(1), REMOTE, keys.clone(), 2),
        Err(GovernanceError::Unauthorized(_))
    ));
    for quorum in [0, 4] {
        assert!(matches!(
            local.set_guardian_set(&admin(), REMOTE, keys.clone(), quorum),
            Err(GovernanceError::InvalidGuardianSet(_))
        ));
    }
    assert!(matches!(
        local.set_guardian_set(&admin(), LOCAL, keys.clone(), 2),
        Err(GovernanceError::InvalidGuardianSet(_))
    ));
    let duplicated = vec![keys[0].clone(), keys[0].clone()];
    assert!(matches!(
        local.set_guardian_set(&admin(), REMOTE, duplicated, 1),
        Err(GovernanceError::InvalidGuardianSet(_))
    ));

    local.set_guardian_set(&admin(), REMOTE, keys.clone(), 3).unwrap();
    let set = local.guardian_set(REMOTE).unwrap().unwrap();
    assert_eq!(set.quorum, 3);
    assert_eq!(set.guardians, keys);
}
