use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("unsupported payload version: {0}")]
    UnsupportedVersion(u8),

    #[error("payload too large: {size} > {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("insufficient guardian signatures: {valid} valid, {quorum} required")]
    InsufficientSignatures { valid: usize, quorum: usize },
}
