// Thin re-export module: implementation is in `blockchain/core.rs`, split
// into the block and ledger types, the participant registry and the
// full-chain validator.

pub mod core;
pub use core::*;
