//! ProvChain - a proof-of-work ledger for supply-chain provenance
//!
//! Participants sign statements about products changing hands. Admitted
//! statements wait in a pending pool, are packed into hash-linked blocks by a
//! leading-zero proof-of-work search, and can be re-verified end to end at
//! any time.
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the ledger, the participant registry and chain validation
//! - [`transaction`] - Signed provenance statements and their block records
//! - [`mempool`] - FIFO pool of admitted transactions
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work search with cancellation
//!
//! ## Cryptography & Encoding
//! - [`crypto`] - secp256k1 signing, verification and key providers
//! - [`encoding`] - Canonical JSON encoding and SHA-256 hex digests
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`logging`] - Tracing subscriber setup

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography & Encoding
// ============================================================================
pub mod crypto;
pub mod encoding;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod logging;

pub use blockchain::{Block, Ledger, MineOutcome};
pub use config::{Config, LedgerConfig};
pub use error::{AdmissionError, ChainError, ValidationError};
pub use transaction::{Transaction, TransactionRecord};
