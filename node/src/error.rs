use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("governance error: {0}")]
    Governance(#[from] council_governance::GovernanceError),

    #[error("store error: {0}")]
    Store(#[from] council_store::StoreError),

    #[error("lmdb error: {0}")]
    Lmdb(#[from] council_store_lmdb::LmdbError),

    #[error("message error: {0}")]
    Message(#[from] council_messages::MessageError),

    #[error("config error: {0}")]
    Config(String),

    #[error("balance history error: {0}")]
    History(String),

    #[error("guardian key error: {0}")]
    GuardianKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
