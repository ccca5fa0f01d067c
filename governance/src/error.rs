use council_messages::MessageError;
use council_store::StoreError;
use council_types::{Address, ChainId, ElectionId, EpochPeriod, MessageHash};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("unauthorized: {0}")]
    Unauthorized(Address),

    #[error("not callable in the current period ({current})")]
    NotCallableInCurrentPeriod { current: EpochPeriod },

    #[error("snapshot contract is not enabled or has no usable snapshot")]
    InvalidSnapshotContract,

    #[error("vote power snapshot already taken for this election")]
    SnapshotAlreadyTaken,

    #[error("invalid guardian signatures from chain {origin}: {valid} valid, {required} required")]
    InvalidSignature {
        origin: ChainId,
        valid: usize,
        required: usize,
    },

    #[error("message {0} already consumed")]
    MessageAlreadyConsumed(MessageHash),

    #[error("sequence {sequence} from chain {origin} already consumed by message {consumed_by}")]
    SequenceAlreadyConsumed {
        origin: ChainId,
        sequence: u64,
        consumed_by: MessageHash,
    },

    #[error("outbound sequence exhausted")]
    OutboxExhausted,

    #[error("ballot for {voter} was exported to chain {destination}")]
    BallotExported { voter: Address, destination: ChainId },

    #[error("value is unchanged")]
    NoChange,

    #[error("zero address")]
    ZeroAddress,

    #[error("{0} is not a reachable snapshot contract")]
    NotAContract(Address),

    #[error("invalid epoch schedule: {0}")]
    InvalidEpochSchedule(String),

    #[error("invalid election settings")]
    InvalidElectionSettings,

    #[error("invalid guardian set: {0}")]
    InvalidGuardianSet(String),

    #[error("council is not initialized")]
    NotInitialized,

    #[error("council is already initialized")]
    AlreadyInitialized,

    #[error("{0} is already nominated")]
    AlreadyNominated(Address),

    #[error("{0} is not nominated")]
    NotNominated(Address),

    #[error("{0} has already cast a vote")]
    VoteAlreadyCast(Address),

    #[error("{0} has no voting power")]
    NoVotingPower(Address),

    #[error("invalid ballot: {0}")]
    InvalidBallot(String),

    #[error("election already evaluated")]
    ElectionAlreadyEvaluated,

    #[error("election not evaluated")]
    ElectionNotEvaluated,

    #[error("message is for election {found}, current is {expected}")]
    ElectionMismatch {
        expected: ElectionId,
        found: ElectionId,
    },

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] MessageError),

    #[error("snapshot provider failure: {0}")]
    Provider(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl GovernanceError {
    /// Whether resubmitting the same request later could succeed without
    /// changing it (period-gated or transient failures).
    pub fn is_retryable_later(&self) -> bool {
        matches!(
            self,
            Self::NotCallableInCurrentPeriod { .. } | Self::Provider(_) | Self::Store(_)
        )
    }
}
