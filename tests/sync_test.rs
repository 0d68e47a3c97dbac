//! End-to-end sync scenarios over an in-memory fake indexer.

use cardano_ledger_sync::indexer::{
    AccountInfo, AddressTransaction, Amount, AssetDetails, IndexerError, LedgerIndexer,
    TransactionContent, TransactionUtxos, TxInput, TxOutput,
};
use cardano_ledger_sync::wallet::balance::BalanceService;
use cardano_ledger_sync::wallet::sync::events::{ChannelEventHandler, EventDispatcher, SyncEvent, SyncPhase};
use cardano_ledger_sync::wallet::sync::store::LedgerStore;
use cardano_ledger_sync::wallet::sync::{SyncConfig, SyncCoordinator, SyncOutcome};
use cardano_ledger_sync::wallet::{SpendStatus, UtxoKey, WalletIdentity, WalletSyncError};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WALLET_ADDR: &str = "addr1q_wallet_payment";
const STAKE_ADDR: &str = "stake1_wallet";
const OTHER_ADDR: &str = "addr1q_elsewhere";

/// Programmable in-memory chain serving the indexer query surface.
#[derive(Default)]
struct FakeIndexer {
    /// stake address -> payment addresses
    accounts: Mutex<HashMap<String, Vec<String>>>,
    /// payment address -> ascending transaction listing
    listings: Mutex<HashMap<String, Vec<AddressTransaction>>>,
    /// tx hash -> (summary, inputs/outputs)
    transactions: Mutex<HashMap<String, (TransactionContent, TransactionUtxos)>>,
    /// stake address -> controlled lovelace
    controlled: Mutex<HashMap<String, String>>,
    detail_calls: AtomicUsize,
    /// artificial delay injected into listing queries
    listing_delay: Mutex<Option<Duration>>,
}

impl FakeIndexer {
    fn add_transaction(
        &self,
        address_hint: &str,
        content: TransactionContent,
        utxos: TransactionUtxos,
    ) {
        self.listings
            .lock()
            .unwrap()
            .entry(address_hint.to_string())
            .or_default()
            .push(AddressTransaction {
                tx_hash: content.hash.clone(),
                block_height: content.block_height,
                block_time: content.block_time,
            });
        self.transactions
            .lock()
            .unwrap()
            .insert(content.hash.clone(), (content, utxos));
    }

    /// Register a transaction fetchable by hash but absent from listings.
    fn add_unlisted_transaction(&self, content: TransactionContent, utxos: TransactionUtxos) {
        self.transactions
            .lock()
            .unwrap()
            .insert(content.hash.clone(), (content, utxos));
    }

    fn set_account(&self, stake: &str, addresses: &[&str], controlled: &str) {
        self.accounts.lock().unwrap().insert(
            stake.to_string(),
            addresses.iter().map(|a| a.to_string()).collect(),
        );
        self.controlled
            .lock()
            .unwrap()
            .insert(stake.to_string(), controlled.to_string());
    }

    fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerIndexer for FakeIndexer {
    async fn account_addresses(&self, stake_address: &str) -> Result<Vec<String>, IndexerError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(stake_address)
            .cloned()
            .unwrap_or_default())
    }

    async fn address_transactions(
        &self,
        address: &str,
        from_block: Option<u64>,
        page: u32,
        count: u32,
    ) -> Result<Vec<AddressTransaction>, IndexerError> {
        let delay = *self.listing_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let rows: Vec<AddressTransaction> = self
            .listings
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|row| from_block.map_or(true, |from| row.block_height >= from))
            .collect();
        let start = ((page - 1) * count) as usize;
        Ok(rows.into_iter().skip(start).take(count as usize).collect())
    }

    async fn transaction(&self, hash: &str) -> Result<TransactionContent, IndexerError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.transactions
            .lock()
            .unwrap()
            .get(hash)
            .map(|(content, _)| content.clone())
            .ok_or_else(|| IndexerError::NotFound(hash.to_string()))
    }

    async fn transaction_utxos(&self, hash: &str) -> Result<TransactionUtxos, IndexerError> {
        self.transactions
            .lock()
            .unwrap()
            .get(hash)
            .map(|(_, utxos)| utxos.clone())
            .ok_or_else(|| IndexerError::NotFound(hash.to_string()))
    }

    async fn account(&self, stake_address: &str) -> Result<AccountInfo, IndexerError> {
        match self.controlled.lock().unwrap().get(stake_address) {
            Some(amount) => Ok(AccountInfo {
                stake_address: stake_address.to_string(),
                controlled_amount: amount.clone(),
                active: true,
            }),
            None => Ok(AccountInfo::unobserved(stake_address)),
        }
    }

    async fn account_assets(&self, _stake_address: &str) -> Result<Vec<Amount>, IndexerError> {
        Ok(Vec::new())
    }

    async fn asset(&self, unit: &str) -> Result<AssetDetails, IndexerError> {
        Err(IndexerError::NotFound(unit.to_string()))
    }
}

fn wallet() -> WalletIdentity {
    WalletIdentity {
        id: "w1".to_string(),
        payment_address: WALLET_ADDR.to_string(),
        stake_address: STAKE_ADDR.to_string(),
    }
}

fn content(hash: &str, height: u64) -> TransactionContent {
    TransactionContent {
        hash: hash.to_string(),
        block: format!("block_{}", height),
        block_height: height,
        block_time: 1_700_000_000 + height,
        slot: height * 20,
        fees: "200000".to_string(),
        size: 300,
        deposit: "0".to_string(),
        asset_mint_or_burn_count: 0,
        redeemer_count: 0,
        withdrawal_count: 0,
    }
}

fn output(address: &str, index: u32, lovelace: &str) -> TxOutput {
    TxOutput {
        address: address.to_string(),
        amount: vec![Amount::lovelace(lovelace)],
        output_index: index,
        data_hash: None,
        inline_datum: None,
        reference_script_hash: None,
        collateral: false,
    }
}

fn input(address: &str, tx_hash: &str, index: u32, lovelace: &str) -> TxInput {
    TxInput {
        address: address.to_string(),
        amount: vec![Amount::lovelace(lovelace)],
        tx_hash: tx_hash.to_string(),
        output_index: index,
        data_hash: None,
        inline_datum: None,
        reference_script_hash: None,
        collateral: false,
        reference: false,
    }
}

/// A chain where one transaction funds the wallet with 5 ada.
fn funded_chain() -> FakeIndexer {
    let indexer = FakeIndexer::default();
    indexer.set_account(STAKE_ADDR, &[WALLET_ADDR], "5000000");
    indexer.add_transaction(
        WALLET_ADDR,
        content("tx_fund", 100),
        TransactionUtxos {
            hash: "tx_fund".to_string(),
            inputs: vec![input(OTHER_ADDR, "tx_genesis", 0, "10000000")],
            outputs: vec![
                output(WALLET_ADDR, 0, "5000000"),
                output(OTHER_ADDR, 1, "4800000"),
            ],
        },
    );
    indexer
}

/// Extend `funded_chain` with a transaction spending the funding UTXO back
/// to the wallet minus the fee.
fn spend_on(indexer: &FakeIndexer) {
    indexer.set_account(STAKE_ADDR, &[WALLET_ADDR], "4800000");
    indexer.add_transaction(
        WALLET_ADDR,
        content("tx_spend", 120),
        TransactionUtxos {
            hash: "tx_spend".to_string(),
            inputs: vec![input(WALLET_ADDR, "tx_fund", 0, "5000000")],
            outputs: vec![output(WALLET_ADDR, 0, "4800000")],
        },
    );
}

fn no_cooldown_config() -> SyncConfig {
    SyncConfig {
        cooldown: Duration::ZERO,
        ..SyncConfig::default()
    }
}

fn coordinator_over(indexer: Arc<FakeIndexer>, config: SyncConfig) -> (SyncCoordinator, Arc<LedgerStore>) {
    let store = Arc::new(LedgerStore::in_memory());
    (
        SyncCoordinator::new(indexer, store.clone(), config),
        store,
    )
}

async fn sync(
    coordinator: &SyncCoordinator,
    force: bool,
) -> Result<SyncOutcome, WalletSyncError> {
    let mut dispatcher = EventDispatcher::new();
    coordinator.sync_wallet(&wallet(), force, &mut dispatcher).await
}

#[tokio::test]
async fn empty_wallet_syncs_to_empty_state() {
    // Scenario A: a wallet with zero transactions syncs cleanly.
    let indexer = Arc::new(FakeIndexer::default());
    let (coordinator, store) = coordinator_over(indexer, no_cooldown_config());

    let (handler, mut events) = ChannelEventHandler::new();
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register_handler(Box::new(handler));

    let outcome = coordinator
        .sync_wallet(&wallet(), false, &mut dispatcher)
        .await
        .unwrap();

    assert!(matches!(outcome, SyncOutcome::UpToDate));
    assert!(store.load_transactions("w1").await.unwrap().is_empty());
    assert!(store.load_utxos("w1").await.unwrap().is_empty());

    // The final event closes the stream with phase Complete and zero items.
    let mut last = None;
    while let Ok(event) = events.try_recv() {
        last = Some(event);
    }
    match last {
        Some(SyncEvent::Progress {
            phase: SyncPhase::Complete,
            new_items: 0,
            ..
        }) => {}
        other => panic!("expected Complete progress event, got {:?}", other),
    }
}

#[tokio::test]
async fn funding_transaction_creates_unspent_utxo() {
    // Scenario B.
    let indexer = Arc::new(funded_chain());
    let (coordinator, store) = coordinator_over(indexer, no_cooldown_config());

    let outcome = sync(&coordinator, false).await.unwrap();
    let report = match outcome {
        SyncOutcome::Completed(report) => report,
        other => panic!("expected completed sync, got {:?}", other),
    };
    assert_eq!(report.new_transactions, 1);
    assert_eq!(report.last_sync_block, 100);

    let utxos = store.load_utxos("w1").await.unwrap();
    let record = &utxos[&UtxoKey::new("tx_fund", 0)];
    assert!(!record.is_spent());
    assert_eq!(record.amount, vec![Amount::lovelace("5000000")]);
    assert!(!record.external);

    let transactions = store.load_transactions("w1").await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].wallet_id, "w1");
}

#[tokio::test]
async fn spend_flips_utxo_and_leaves_one_unspent() {
    // Scenario C, across two incremental syncs.
    let indexer = Arc::new(funded_chain());
    let (coordinator, store) = coordinator_over(indexer.clone(), no_cooldown_config());

    sync(&coordinator, false).await.unwrap();
    spend_on(&indexer);
    let outcome = sync(&coordinator, false).await.unwrap();
    match outcome {
        SyncOutcome::Completed(report) => assert_eq!(report.new_transactions, 1),
        other => panic!("expected completed sync, got {:?}", other),
    }

    let utxos = store.load_utxos("w1").await.unwrap();
    let consumed = &utxos[&UtxoKey::new("tx_fund", 0)];
    assert_eq!(
        consumed.spend,
        SpendStatus::Spent {
            tx_hash: "tx_spend".to_string()
        }
    );

    let unspent: Vec<_> = utxos
        .values()
        .filter(|u| !u.is_spent() && !u.external)
        .collect();
    assert_eq!(unspent.len(), 1);
    assert_eq!(unspent[0].key(), UtxoKey::new("tx_spend", 0));

    // Uniqueness: keys are unique by construction of the map, and every
    // record agrees with its own key.
    let mut seen = HashSet::new();
    for (key, record) in &utxos {
        assert_eq!(*key, record.key());
        assert!(seen.insert(key.clone()));
    }
}

#[tokio::test]
async fn second_sync_without_activity_is_incremental() {
    let indexer = Arc::new(funded_chain());
    let (coordinator, _store) = coordinator_over(indexer.clone(), no_cooldown_config());

    sync(&coordinator, false).await.unwrap();
    let details_after_first = indexer.detail_calls();

    let outcome = sync(&coordinator, false).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::UpToDate));
    // No transaction detail fetches happened on the second pass.
    assert_eq!(indexer.detail_calls(), details_after_first);
}

#[tokio::test]
async fn resync_over_same_chain_is_idempotent() {
    let indexer = Arc::new(funded_chain());
    spend_on(&indexer);
    let (coordinator, store) = coordinator_over(indexer, no_cooldown_config());

    sync(&coordinator, false).await.unwrap();
    let first: HashMap<_, _> = store.load_utxos("w1").await.unwrap();

    // Force the next pass to re-walk the chain from genesis.
    store
        .save_checkpoint(
            "w1",
            &cardano_ledger_sync::wallet::SyncCheckpoint {
                last_sync_block: 0,
                last_full_sync: chrono::Utc::now(),
            },
        )
        .await
        .unwrap();
    sync(&coordinator, false).await.unwrap();
    let second = store.load_utxos("w1").await.unwrap();

    assert_eq!(first.len(), second.len());
    for (key, record) in &first {
        let other = &second[key];
        assert_eq!(record.spend, other.spend);
        assert_eq!(record.amount, other.amount);
        assert_eq!(record.external, other.external);
    }
}

#[tokio::test]
async fn local_balance_matches_account_balance() {
    // Conservation over a wallet with only simple activity.
    let indexer = Arc::new(funded_chain());
    spend_on(&indexer);
    let (coordinator, store) = coordinator_over(indexer.clone(), no_cooldown_config());
    sync(&coordinator, false).await.unwrap();

    let balances = BalanceService::new(indexer, store);
    let local = balances.local_balance("w1").await.unwrap();
    let account = balances.account_balance(STAKE_ADDR).await.unwrap();
    assert_eq!(local, account);
    assert_eq!(local, 4_800_000);
}

#[tokio::test]
async fn external_input_placeholder_completes_on_demand() {
    // Scenario D: the wallet receives from a transaction whose own funding
    // transaction is never listed for any wallet address.
    let indexer = Arc::new(FakeIndexer::default());
    indexer.set_account(STAKE_ADDR, &[WALLET_ADDR], "6800000");
    indexer.add_transaction(
        WALLET_ADDR,
        content("tx_receive", 130),
        TransactionUtxos {
            hash: "tx_receive".to_string(),
            inputs: vec![input(OTHER_ADDR, "tx_unknown", 2, "7000000")],
            outputs: vec![output(WALLET_ADDR, 0, "6800000")],
        },
    );
    indexer.add_unlisted_transaction(
        content("tx_unknown", 90),
        TransactionUtxos {
            hash: "tx_unknown".to_string(),
            inputs: vec![],
            outputs: vec![
                output(OTHER_ADDR, 0, "1000000"),
                output(OTHER_ADDR, 1, "2000000"),
                output(OTHER_ADDR, 2, "7000000"),
            ],
        },
    );

    let (coordinator, store) = coordinator_over(indexer, no_cooldown_config());
    sync(&coordinator, false).await.unwrap();

    let key = UtxoKey::new("tx_unknown", 2);
    let placeholder = store.get_utxo("w1", &key).await.unwrap().unwrap();
    assert!(placeholder.external);
    assert!(placeholder.is_spent());
    assert!(!placeholder.is_complete());

    let completed = coordinator.completer().complete("w1", &key).await.unwrap();
    assert!(completed.is_complete());
    assert_eq!(completed.block.as_deref(), Some("block_90"));
    assert_eq!(completed.amount, vec![Amount::lovelace("7000000")]);
    // Spend state survives completion.
    assert!(completed.is_spent());

    // Completion persisted the record; a second call is a no-op read.
    let stored = store.get_utxo("w1", &key).await.unwrap().unwrap();
    assert!(stored.is_complete());
}

#[tokio::test]
async fn cooldown_rejects_immediate_resync_unless_forced() {
    let indexer = Arc::new(funded_chain());
    let config = SyncConfig {
        cooldown: Duration::from_secs(3600),
        ..SyncConfig::default()
    };
    let (coordinator, _store) = coordinator_over(indexer, config);

    sync(&coordinator, false).await.unwrap();

    match sync(&coordinator, false).await {
        Err(WalletSyncError::CooldownActive(id)) => assert_eq!(id, "w1"),
        other => panic!("expected CooldownActive, got {:?}", other),
    }

    // A forced request ignores the cooldown.
    assert!(matches!(
        sync(&coordinator, true).await.unwrap(),
        SyncOutcome::UpToDate
    ));
}

#[tokio::test]
async fn concurrent_sync_for_same_wallet_is_rejected() {
    let indexer = Arc::new(funded_chain());
    *indexer.listing_delay.lock().unwrap() = Some(Duration::from_millis(300));
    let (coordinator, _store) = coordinator_over(indexer, no_cooldown_config());
    let coordinator = Arc::new(coordinator);

    let slow = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { sync(&coordinator, false).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    match sync(&coordinator, false).await {
        Err(WalletSyncError::AlreadyInProgress(id)) => assert_eq!(id, "w1"),
        other => panic!("expected AlreadyInProgress, got {:?}", other),
    }

    // The original sync is unaffected by the rejected request.
    assert!(slow.await.unwrap().is_ok());
}

#[tokio::test]
async fn timeout_fails_the_sync_and_releases_the_registry() {
    let indexer = Arc::new(funded_chain());
    *indexer.listing_delay.lock().unwrap() = Some(Duration::from_millis(500));
    let config = SyncConfig {
        cooldown: Duration::ZERO,
        timeout: Duration::from_millis(100),
        ..SyncConfig::default()
    };
    let (coordinator, store) = coordinator_over(indexer.clone(), config);

    match sync(&coordinator, false).await {
        Err(WalletSyncError::Timeout(_)) => {}
        other => panic!("expected Timeout, got {:?}", other),
    }
    // The watermark was never advanced by the failed pass.
    assert!(store.load_checkpoint("w1").await.unwrap().is_none());

    // The registry entry was released; a later, unthrottled pass succeeds.
    *indexer.listing_delay.lock().unwrap() = None;
    assert!(matches!(
        sync(&coordinator, false).await.unwrap(),
        SyncOutcome::Completed(_)
    ));
}

#[tokio::test]
async fn batch_sync_covers_every_wallet() {
    let indexer = Arc::new(funded_chain());
    let config = SyncConfig {
        cooldown: Duration::ZERO,
        batch_delay: Duration::from_millis(1),
        ..SyncConfig::default()
    };
    let (coordinator, _store) = coordinator_over(indexer, config);

    let wallets: Vec<WalletIdentity> = (0..5)
        .map(|i| WalletIdentity {
            id: format!("w{}", i),
            payment_address: format!("addr1q_other_{}", i),
            stake_address: format!("stake1_other_{}", i),
        })
        .collect();

    let results = coordinator.sync_all(&wallets, false).await;
    assert_eq!(results.len(), 5);
    for (id, result) in results {
        assert!(result.is_ok(), "wallet {} failed: {:?}", id, result);
    }
}

#[tokio::test]
async fn wallet_deletion_purges_all_collections() {
    let indexer = Arc::new(funded_chain());
    let (coordinator, store) = coordinator_over(indexer, no_cooldown_config());
    sync(&coordinator, false).await.unwrap();

    assert!(!store.load_utxos("w1").await.unwrap().is_empty());
    store.delete_wallet("w1").await.unwrap();

    assert!(store.load_transactions("w1").await.unwrap().is_empty());
    assert!(store.load_utxos("w1").await.unwrap().is_empty());
    assert!(store.load_checkpoint("w1").await.unwrap().is_none());
}
