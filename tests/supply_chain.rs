//! End-to-end provenance flow through the public API

use provchain::blockchain::{Ledger, MineOutcome, GENESIS_PREVIOUS_HASH};
use provchain::config::{Config, LedgerConfig};
use provchain::crypto::{FileKeyStore, InMemoryKeyStore, KeyProvider};
use provchain::logging::init_tracing;
use provchain::miner::{CancellationToken, MiningControl};
use provchain::transaction::Transaction;
use provchain::{AdmissionError, ChainError};
use std::thread;
use std::time::Duration;

/// Helper to build a ledger with registered participants
fn create_test_ledger(
    config: LedgerConfig,
    keys: &mut dyn KeyProvider,
    names: &[&str],
) -> Result<Ledger, Box<dyn std::error::Error>> {
    init_tracing(&Config::default().logging);
    let mut ledger = Ledger::new(config)?;
    for name in names {
        let keypair = keys.load_or_create(name)?;
        ledger.register_participant(*name, keypair.public_key);
    }
    Ok(ledger)
}

#[test]
fn test_alice_to_bob_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let mut keys = InMemoryKeyStore::new();
    let mut ledger = create_test_ledger(LedgerConfig::new(2, 3), &mut keys, &["Alice", "Bob"])?;
    let genesis_hash = ledger.latest_block().hash().to_string();
    assert_eq!(ledger.blocks()[0].previous_hash(), GENESIS_PREVIOUS_HASH);

    let mut tx = Transaction::new("P1", "Alice", "Bob", "Farm gate", "Handed over");
    tx.sign(&keys.load_or_create("Alice")?)?;
    assert!(ledger.submit_transaction(tx));

    let outcome = ledger.mine_pending()?;
    assert!(matches!(outcome, MineOutcome::Mined { index: 1, transactions: 1, .. }));

    let block = &ledger.blocks()[1];
    assert_eq!(block.index(), 1);
    assert_eq!(block.previous_hash(), genesis_hash);
    assert!(block.hash().starts_with("00"));
    assert!(ledger.is_valid());

    // Signature verification sees the frozen record, not the caller's copy.
    let record = &block.transactions()[0];
    let alice = keys.load_or_create("Alice")?;
    assert!(Transaction::from(record).verify(&alice.public_key));
    let mut forged = Transaction::from(record);
    forged.signature.as_mut().ok_or("record should be signed")?[0] ^= 0xFF;
    assert!(!forged.verify(&alice.public_key));

    Ok(())
}

#[test]
fn test_farm_to_store_provenance() -> Result<(), Box<dyn std::error::Error>> {
    let mut keys = InMemoryKeyStore::new();
    let participants = ["FarmerJoe", "DistributorMike", "RetailerLisa"];
    let mut ledger = create_test_ledger(LedgerConfig::new(1, 3), &mut keys, &participants)?;

    let hops = [
        ("FarmerJoe", "DistributorMike", "Farmville", "Harvested 100kg apples"),
        ("DistributorMike", "RetailerLisa", "Central Warehouse", "Shipped 100kg apples"),
    ];
    for (sender, receiver, location, description) in hops {
        let mut tx = Transaction::new("PRD001", sender, receiver, location, description);
        tx.sign(&keys.load_or_create(sender)?)?;
        assert!(ledger.submit_transaction(tx));
    }
    ledger.mine_pending()?;

    let mut sale = Transaction::new("PRD001", "RetailerLisa", "Customer", "Downtown Store", "Sold 10kg apples");
    sale.sign(&keys.load_or_create("RetailerLisa")?)?;
    assert!(ledger.submit_transaction(sale));
    ledger.mine_pending()?;

    assert_eq!(ledger.len(), 3);
    assert!(ledger.is_valid());

    let history = ledger.product_history("PRD001");
    let route: Vec<(u64, &str)> = history
        .iter()
        .map(|(index, record)| (*index, record.receiver.as_str()))
        .collect();
    assert_eq!(route, vec![(1, "DistributorMike"), (1, "RetailerLisa"), (2, "Customer")]);

    Ok(())
}

#[test]
fn test_admission_gating() -> Result<(), Box<dyn std::error::Error>> {
    let mut keys = InMemoryKeyStore::new();
    let mut ledger = create_test_ledger(LedgerConfig::new(0, 3), &mut keys, &["Alice"])?;

    let mut outsider = Transaction::new("P1", "Eve", "Alice", "Alley", "Counterfeit");
    outsider.sign(&keys.load_or_create("Eve")?)?;
    assert_eq!(
        ledger.try_submit_transaction(outsider),
        Err(AdmissionError::UnknownSender("Eve".to_string()))
    );
    assert_eq!(ledger.pending().len(), 0);

    let mut tx = Transaction::new("P1", "Alice", "Bob", "Dock", "Pallet");
    tx.sign(&keys.load_or_create("Alice")?)?;
    tx.description = "Two pallets".to_string();
    assert_eq!(
        ledger.try_submit_transaction(tx),
        Err(AdmissionError::InvalidSignature("Alice".to_string()))
    );
    assert_eq!(ledger.pending().len(), 0);

    assert_eq!(ledger.mine_pending()?, MineOutcome::NothingToMine);
    assert_eq!(ledger.len(), 1);

    Ok(())
}

#[test]
fn test_many_blocks_stay_valid() -> Result<(), Box<dyn std::error::Error>> {
    let mut keys = InMemoryKeyStore::new();
    let mut ledger = create_test_ledger(LedgerConfig::new(1, 2), &mut keys, &["Alice", "Bob"])?;

    for i in 0..7 {
        let (sender, receiver) = if i % 2 == 0 { ("Alice", "Bob") } else { ("Bob", "Alice") };
        let mut tx = Transaction::new(format!("LOT-{}", i), sender, receiver, "Port", "Container");
        tx.sign(&keys.load_or_create(sender)?)?;
        assert!(ledger.submit_transaction(tx));
    }

    while !ledger.pending().is_empty() {
        ledger.mine_pending()?;
        assert!(ledger.is_valid());
    }

    assert_eq!(ledger.len(), 5);
    for pair in ledger.blocks().windows(2) {
        assert_eq!(pair[1].previous_hash(), pair[0].hash());
        assert!(pair[1].hash().starts_with('0'));
    }

    Ok(())
}

#[test]
fn test_mining_cancelled_from_another_thread() -> Result<(), Box<dyn std::error::Error>> {
    let mut keys = InMemoryKeyStore::new();
    let mut ledger = create_test_ledger(LedgerConfig::new(64, 3), &mut keys, &["Alice"])?;

    let mut tx = Transaction::new("P1", "Alice", "Bob", "Dock", "Pallet");
    tx.sign(&keys.load_or_create("Alice")?)?;
    assert!(ledger.submit_transaction(tx));

    let token = CancellationToken::new();
    let canceller = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            token.cancel();
        })
    };

    let result = ledger.mine_pending_with(&MiningControl::new().with_cancellation(token));
    canceller.join().map_err(|_| "canceller thread panicked")?;

    assert!(matches!(result, Err(ChainError::MiningCancelled { .. })));
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.pending().len(), 1);

    Ok(())
}

#[test]
fn test_file_keys_survive_restart() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::TempDir::new()?;

    let mut tx = Transaction::new("P7", "FarmerJoe", "DistributorMike", "Farmville", "Crates");
    {
        let mut store = FileKeyStore::new(temp_dir.path());
        tx.sign(&store.load_or_create("FarmerJoe")?)?;
    }

    let mut store = FileKeyStore::new(temp_dir.path());
    let mut ledger = create_test_ledger(LedgerConfig::new(1, 3), &mut store, &["FarmerJoe"])?;
    assert!(ledger.submit_transaction(tx));
    ledger.mine_pending()?;
    assert!(ledger.is_valid());

    Ok(())
}
