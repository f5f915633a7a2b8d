//! Proof-of-work search over a block's nonce.

use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// `true` when the hex hash starts with at least `difficulty` `'0'` digits.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Shared flag a caller can flip from another thread to stop a search.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on a single proof-of-work search.
#[derive(Debug, Clone, Default)]
pub struct MiningControl {
    pub cancel: CancellationToken,
    pub max_attempts: Option<u64>,
}

impl MiningControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Increment the nonce until the block hash meets `difficulty`.
///
/// The cancellation flag and attempt cap are checked once per nonce. A
/// block whose starting nonce already satisfies the target is returned
/// unchanged.
pub fn mine_block(mut block: Block, difficulty: usize, control: &MiningControl) -> Result<Block> {
    debug!("Mining block #{} at difficulty {}", block.index(), difficulty);
    let start = Instant::now();
    let mut attempts: u64 = 0;

    while !meets_difficulty(block.hash(), difficulty) {
        if control.cancel.is_cancelled() {
            return Err(ChainError::MiningCancelled { attempts });
        }
        if control.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(ChainError::MiningExhausted { attempts });
        }
        let next = block
            .nonce()
            .checked_add(1)
            .ok_or(ChainError::MiningExhausted { attempts })?;
        block.set_nonce(next)?;
        attempts += 1;
    }

    info!(
        "Block #{} mined after {} attempts in {:?}: {}",
        block.index(),
        attempts,
        start.elapsed(),
        block.hash()
    );
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Block {
        Block::new(1, &[], 1_700_000_000.0, "0".repeat(64)).unwrap()
    }

    #[test]
    fn test_meets_difficulty() {
        assert!(meets_difficulty("00ab", 2));
        assert!(meets_difficulty("00ab", 0));
        assert!(!meets_difficulty("0a0b", 2));
        assert!(!meets_difficulty("00", 3));
        assert!(meets_difficulty("", 0));
    }

    #[test]
    fn test_difficulty_zero_keeps_nonce_zero() {
        let block = mine_block(candidate(), 0, &MiningControl::new()).unwrap();
        assert_eq!(block.nonce(), 0);
    }

    #[test]
    fn test_mined_hash_meets_difficulty() {
        let block = mine_block(candidate(), 2, &MiningControl::new()).unwrap();
        assert!(block.hash().starts_with("00"));
        assert_eq!(block.calculate_hash().unwrap(), block.hash());
    }

    #[test]
    fn test_attempt_cap() {
        let result = mine_block(candidate(), 64, &MiningControl::new().with_max_attempts(25));
        assert!(matches!(result, Err(ChainError::MiningExhausted { attempts: 25 })));
    }

    #[test]
    fn test_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let control = MiningControl::new().with_cancellation(token.clone());

        let result = mine_block(candidate(), 64, &control);
        assert!(matches!(result, Err(ChainError::MiningCancelled { attempts: 0 })));
        assert!(token.is_cancelled());
    }
}
