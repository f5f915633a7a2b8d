use crate::blockchain::core::registry::ParticipantRegistry;
use crate::blockchain::core::validation::validate_chain;
use crate::config::LedgerConfig;
use crate::encoding::{require_finite, sha256_hex, to_canonical_json};
use crate::error::{AdmissionError, ChainError, ValidationError};
use crate::mempool::Mempool;
use crate::miner::{mine_block, MiningControl};
use crate::transaction::{now_seconds, Transaction, TransactionRecord};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) transactions: Vec<TransactionRecord>,
    pub(crate) timestamp: f64,
    pub(crate) previous_hash: String,
    pub(crate) nonce: u64,
    pub(crate) hash: String,
}

/// Everything the block hash covers, i.e. all fields except the hash.
#[derive(Serialize)]
struct BlockContents<'a> {
    index: u64,
    transactions: &'a [TransactionRecord],
    timestamp: f64,
    previous_hash: &'a str,
    nonce: u64,
}

impl Block {
    /// Build a candidate block with nonce 0. Transactions are copied into
    /// records, so later changes to the originals do not reach the block.
    pub fn new(
        index: u64,
        transactions: &[Transaction],
        timestamp: f64,
        previous_hash: impl Into<String>,
    ) -> Result<Self, ChainError> {
        let mut block = Block {
            index,
            transactions: transactions.iter().map(Transaction::to_record).collect(),
            timestamp,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash()?;
        Ok(block)
    }

    pub fn genesis(timestamp: f64) -> Result<Self, ChainError> {
        Self::new(0, &[], timestamp, GENESIS_PREVIOUS_HASH)
    }

    /// SHA-256 over the canonical encoding of the current contents.
    pub fn calculate_hash(&self) -> Result<String, ChainError> {
        require_finite(self.timestamp, "block timestamp")?;
        for record in &self.transactions {
            require_finite(record.timestamp, "transaction timestamp")?;
        }
        let contents = BlockContents {
            index: self.index,
            transactions: &self.transactions,
            timestamp: self.timestamp,
            previous_hash: &self.previous_hash,
            nonce: self.nonce,
        };
        Ok(sha256_hex(&to_canonical_json(&contents)?))
    }

    /// Change the nonce and refresh the hash to match.
    pub fn set_nonce(&mut self, nonce: u64) -> Result<(), ChainError> {
        self.nonce = nonce;
        self.hash = self.calculate_hash()?;
        Ok(())
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

/// Result of a call to [`Ledger::mine_pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    /// The pending pool was empty.
    NothingToMine,
    Mined {
        index: u64,
        hash: String,
        transactions: usize,
    },
}

/// A single in-process chain together with its participant registry and
/// pending pool.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) blocks: Vec<Block>,
    config: LedgerConfig,
    participants: ParticipantRegistry,
    mempool: Mempool,
}

impl Ledger {
    /// Create a ledger holding only a freshly stamped genesis block.
    pub fn new(config: LedgerConfig) -> Result<Self, ChainError> {
        config.validate()?;
        let genesis = Block::genesis(now_seconds())?;
        debug!("Genesis block created: {}", genesis.hash());

        Ok(Ledger {
            blocks: vec![genesis],
            config,
            participants: ParticipantRegistry::new(),
            mempool: Mempool::new(),
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a ledger starts with its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn latest_block(&self) -> &Block {
        // The chain is created with genesis and never shrinks.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    pub fn max_transactions(&self) -> usize {
        self.config.max_transactions
    }

    pub fn pending(&self) -> &Mempool {
        &self.mempool
    }

    pub fn participants(&self) -> &ParticipantRegistry {
        &self.participants
    }

    pub fn register_participant(&mut self, identity: impl Into<String>, public_key: PublicKey) {
        self.participants.register(identity, public_key);
    }

    pub fn participant_key(&self, identity: &str) -> Option<&PublicKey> {
        self.participants.get(identity)
    }

    /// Admit a signed transaction into the pending pool. This is the only
    /// signature check before mining; blocks are re-checked by
    /// [`Ledger::validate_chain`].
    pub fn try_submit_transaction(&mut self, tx: Transaction) -> Result<(), AdmissionError> {
        let Some(public_key) = self.participants.get(&tx.sender) else {
            warn!("Sender {} not registered.", tx.sender);
            return Err(AdmissionError::UnknownSender(tx.sender));
        };
        if !tx.verify(public_key) {
            warn!("Invalid signature for transaction from {}.", tx.sender);
            return Err(AdmissionError::InvalidSignature(tx.sender));
        }

        info!("Transaction from {} added.", tx.sender);
        self.mempool.push(tx);
        Ok(())
    }

    /// Boolean form of [`Ledger::try_submit_transaction`].
    pub fn submit_transaction(&mut self, tx: Transaction) -> bool {
        self.try_submit_transaction(tx).is_ok()
    }

    /// Mine the oldest pending transactions into a new block, bounded by the
    /// ledger's configured attempt cap.
    pub fn mine_pending(&mut self) -> Result<MineOutcome, ChainError> {
        let mut control = MiningControl::new();
        control.max_attempts = self.config.max_attempts;
        self.mine_pending_with(&control)
    }

    /// Like [`Ledger::mine_pending`] with caller-supplied cancellation and
    /// attempt cap. When mining stops early the chain and pending pool are
    /// left as they were.
    pub fn mine_pending_with(&mut self, control: &MiningControl) -> Result<MineOutcome, ChainError> {
        if self.mempool.is_empty() {
            info!("No transactions to mine.");
            return Ok(MineOutcome::NothingToMine);
        }

        let batch: Vec<Transaction> = self
            .mempool
            .peek_batch(self.config.max_transactions)
            .cloned()
            .collect();
        let candidate = Block::new(
            self.blocks.len() as u64,
            &batch,
            now_seconds(),
            self.latest_block().hash(),
        )?;

        let block = mine_block(candidate, self.config.difficulty, control)?;
        self.mempool.drain_batch(batch.len());

        let outcome = MineOutcome::Mined {
            index: block.index(),
            hash: block.hash().to_string(),
            transactions: batch.len(),
        };
        info!("Block #{} mined with {} transactions.", block.index(), batch.len());
        self.blocks.push(block);
        Ok(outcome)
    }

    /// Walk the whole chain, reporting the first failing block.
    pub fn validate_chain(&self) -> Result<(), ValidationError> {
        validate_chain(&self.blocks, &self.participants)
    }

    pub fn is_valid(&self) -> bool {
        match self.validate_chain() {
            Ok(()) => true,
            Err(e) => {
                warn!("Chain validation failed: {}", e);
                false
            }
        }
    }

    /// Every recorded movement of `product_id`, oldest first, with the index
    /// of the block that holds it.
    pub fn product_history(&self, product_id: &str) -> Vec<(u64, &TransactionRecord)> {
        self.blocks
            .iter()
            .flat_map(|block| {
                block
                    .transactions()
                    .iter()
                    .filter(move |record| record.product_id == product_id)
                    .map(move |record| (block.index(), record))
            })
            .collect()
    }
}

impl Default for Ledger {
    /// A ledger with [`LedgerConfig::default`].
    ///
    /// # Panics
    ///
    /// Never in practice: the default config passes validation and an empty
    /// genesis block stamped with the current time always encodes.
    fn default() -> Self {
        Ledger::new(LedgerConfig::default()).expect("default ledger config is valid")
    }
}
