//! Shared fixtures for the governance integration tests.

#![allow(dead_code)]

use council_governance::{GovernanceEngine, GovernanceError};
use council_nullables::{
    guardian_keys, public_keys, NullClock, NullProviderDirectory, NullSnapshotProvider, NullStore,
};
use council_types::{
    Address, ChainId, ElectionId, ElectionSettings, EpochPeriod, EpochSchedule, KeyPair, Timestamp,
};
use std::sync::Arc;

pub type TestEngine = GovernanceEngine<NullStore, NullClock, NullProviderDirectory>;

pub const LOCAL: ChainId = ChainId(1);
pub const REMOTE: ChainId = ChainId(2);
pub const E1: ElectionId = ElectionId::FIRST;

pub const NOMINATION_START: u64 = 100;
pub const VOTING_START: u64 = 200;
pub const EVALUATION_START: u64 = 300;

/// A time inside each period of the default schedule.
pub const IN_ADMINISTRATION: u64 = 50;
pub const IN_NOMINATION: u64 = 150;
pub const IN_VOTING: u64 = 250;
pub const IN_EVALUATION: u64 = 350;

pub fn addr(b: u8) -> Address {
    Address::repeat_byte(b)
}

pub fn admin() -> Address {
    addr(0xAA)
}

pub fn settings() -> ElectionSettings {
    ElectionSettings {
        epoch_seat_count: 2,
        epoch_duration_secs: 1_000,
        nomination_period_secs: 200,
        voting_period_secs: 200,
        min_nomination_period_secs: 50,
        min_voting_period_secs: 50,
        min_epoch_duration_secs: 300,
        max_date_adjustment_tolerance_secs: 0,
    }
}

pub fn schedule(nomination: u64, voting: u64, evaluation: u64) -> EpochSchedule {
    EpochSchedule {
        administration_start: Timestamp::new(0),
        nomination_start: Timestamp::new(nomination),
        voting_start: Timestamp::new(voting),
        evaluation_start: Timestamp::new(evaluation),
    }
}

/// An uninitialized engine with its clock at zero.
pub fn bare_engine() -> TestEngine {
    GovernanceEngine::new(NullStore::new(), NullClock::new(0), NullProviderDirectory::new())
}

/// An engine initialized on `chain` with the default schedule.
pub fn engine_on(chain: ChainId) -> TestEngine {
    let engine = bare_engine();
    engine
        .initialize(
            admin(),
            chain,
            settings(),
            schedule(NOMINATION_START, VOTING_START, EVALUATION_START),
        )
        .expect("initialize");
    engine
}

pub fn engine() -> TestEngine {
    engine_on(LOCAL)
}

/// Register and enable a nullable token at `address`.
pub fn enable_token(engine: &TestEngine, address: Address) -> Arc<NullSnapshotProvider> {
    let token = engine.directory().register_null(address);
    engine
        .set_snapshot_contract(&admin(), address, true)
        .expect("enable provider");
    token
}

/// Enable a token, give `balances` to voters and freeze them during Nomination.
pub fn snapshotted_token(
    engine: &TestEngine,
    address: Address,
    balances: &[(Address, u128)],
) -> Arc<NullSnapshotProvider> {
    let token = enable_token(engine, address);
    for (voter, amount) in balances {
        token.set_balance(*voter, *amount);
    }
    engine.clock().set(IN_NOMINATION);
    engine
        .take_vote_power_snapshot(&address)
        .expect("snapshot");
    token
}

/// Guardian keys plus the trust set installed on `engine` for `origin`.
pub fn trust(engine: &TestEngine, origin: ChainId, count: u8, quorum: u8) -> Vec<KeyPair> {
    let keys = guardian_keys(count);
    engine
        .set_guardian_set(&admin(), origin, public_keys(&keys), quorum)
        .expect("guardian set");
    keys
}

pub fn assert_wrong_period<T: std::fmt::Debug>(
    result: Result<T, GovernanceError>,
    current: EpochPeriod,
) {
    match result {
        Err(GovernanceError::NotCallableInCurrentPeriod { current: got }) => {
            assert_eq!(got, current)
        }
        other => panic!("expected NotCallableInCurrentPeriod({current}), got {other:?}"),
    }
}
