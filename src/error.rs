//! Error types for ProvChain

use thiserror::Error;

/// Failures of the ledger's capabilities and of operations that cannot
/// complete. Authorization and integrity outcomes are not errors here; they
/// are reported through [`AdmissionError`] and [`ValidationError`].
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
    #[error("Encoding error: {0}")]
    EncodingError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid identity name: {0:?}")]
    InvalidIdentity(String),
    #[error("Mining cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },
    #[error("Mining gave up after {attempts} attempts without meeting difficulty")]
    MiningExhausted { attempts: u64 },
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::EncodingError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Why a transaction was refused at submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("Sender {0} is not a registered participant")]
    UnknownSender(String),
    #[error("Invalid signature for transaction from {0}")]
    InvalidSignature(String),
}

/// The first integrity or authorization failure found while walking the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Hash mismatch at block {index}")]
    HashMismatch { index: u64 },
    #[error("Previous hash mismatch at block {index}")]
    BrokenLink { index: u64 },
    #[error("Unknown sender {sender} in block {index}")]
    UnknownSender { index: u64, sender: String },
    #[error("Invalid transaction signature from {sender} in block {index}")]
    InvalidSignature { index: u64, sender: String },
}

impl ValidationError {
    /// Index of the block that failed validation.
    pub fn block_index(&self) -> u64 {
        match self {
            ValidationError::HashMismatch { index }
            | ValidationError::BrokenLink { index }
            | ValidationError::UnknownSender { index, .. }
            | ValidationError::InvalidSignature { index, .. } => *index,
        }
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
