//! Pending pool of admitted transactions awaiting a block.

use crate::transaction::Transaction;
use std::collections::VecDeque;

/// FIFO queue. Transactions only enter through
/// [`crate::blockchain::Ledger::submit_transaction`], which has already
/// checked their signatures.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: VecDeque<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tx: Transaction) {
        self.transactions.push_back(tx);
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The oldest `max` transactions, without removing them.
    pub fn peek_batch(&self, max: usize) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().take(max)
    }

    /// Remove and return the oldest `max` transactions.
    pub fn drain_batch(&mut self, max: usize) -> Vec<Transaction> {
        let count = max.min(self.transactions.len());
        self.transactions.drain(..count).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(product: &str) -> Transaction {
        Transaction::with_timestamp(product, "Alice", "Bob", "Depot", "", 1.0)
    }

    #[test]
    fn test_fifo_batches() {
        let mut pool = Mempool::new();
        for p in ["P1", "P2", "P3"] {
            pool.push(tx(p));
        }

        let peeked: Vec<_> = pool.peek_batch(2).map(|t| t.product_id.as_str()).collect();
        assert_eq!(peeked, vec!["P1", "P2"]);
        assert_eq!(pool.len(), 3);

        let batch = pool.drain_batch(2);
        assert_eq!(batch.iter().map(|t| t.product_id.as_str()).collect::<Vec<_>>(), vec!["P1", "P2"]);
        assert_eq!(pool.iter().next().unwrap().product_id, "P3");
    }

    #[test]
    fn test_drain_more_than_available() {
        let mut pool = Mempool::new();
        pool.push(tx("P1"));
        assert_eq!(pool.drain_batch(10).len(), 1);
        assert!(pool.is_empty());
        assert!(pool.drain_batch(3).is_empty());
    }
}
