//! Wallet sync coordinator and integration point for all sync services.
//!
//! This module defines the `SyncCoordinator`, which drives a full incremental
//! sync pass for a wallet: resolve the wallet's payment addresses, discover
//! new transaction hashes above the persisted watermark, fetch details for
//! the genuinely new ones, reconcile the UTXO set, and persist everything
//! followed by the advanced checkpoint.
//!
//! The coordinator owns the concurrency guards the engine relies on:
//! - an in-progress registry enforcing at most one sync per wallet id,
//!   checked-and-set under a single lock
//! - a cooldown clock rejecting non-forced requests inside the cooldown
//!   window
//! - a whole-sync timeout; partial work persisted before a timeout remains
//!   valid because every write is idempotent
//!
//! Both guards are instance state, so independent coordinator instances form
//! independent wallet universes.

use crate::indexer::LedgerIndexer;
use crate::wallet::sync::{
    addresses::AddressResolver,
    completion::UtxoCompleter,
    events::{EventDispatcher, LoggingEventHandler, SyncEvent, SyncPhase},
    fetcher::{FetcherConfig, TransactionFetcher},
    progress::{SyncProgressTracker, SyncStats},
    store::LedgerStore,
    utxo_builder::UtxoBuilder,
};
use crate::wallet::types::{SyncCheckpoint, TransactionRecord, WalletIdentity, WalletSyncError};

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Configuration for the sync coordinator.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Window after a successful sync during which non-forced requests are
    /// rejected with `CooldownActive`.
    pub cooldown: Duration,
    /// Hard bound on one sync pass; hitting it fails the sync.
    pub timeout: Duration,
    /// Wallets synced concurrently per batch in `sync_all`.
    pub batch_size: usize,
    /// Pause between batches, bounding indexer request concurrency.
    pub batch_delay: Duration,
    /// Pagination and fan-out settings for the transaction fetcher.
    pub fetcher: FetcherConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(30),
            timeout: Duration::from_secs(60),
            batch_size: 3,
            batch_delay: Duration::from_millis(500),
            fetcher: FetcherConfig::default(),
        }
    }
}

/// Result of a successful sync pass.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub new_transactions: usize,
    pub skipped_transactions: usize,
    pub new_utxos: usize,
    pub completed_utxos: usize,
    pub spent_utxos: usize,
    /// Watermark persisted at the end of the pass.
    pub last_sync_block: u64,
    pub stats: SyncStats,
}

/// Outcome of a sync request that ran to completion.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// New transactions were ingested and the checkpoint advanced.
    Completed(SyncReport),
    /// No new chain activity; nothing was fetched in detail.
    UpToDate,
}

/// Main wallet sync coordinator.
pub struct SyncCoordinator {
    indexer: Arc<dyn LedgerIndexer>,
    store: Arc<LedgerStore>,
    config: SyncConfig,

    // Services
    resolver: AddressResolver,
    fetcher: TransactionFetcher,

    // Guards
    in_progress: Mutex<HashSet<String>>,
    last_completed: Mutex<HashMap<String, Instant>>,
}

impl SyncCoordinator {
    pub fn new(
        indexer: Arc<dyn LedgerIndexer>,
        store: Arc<LedgerStore>,
        config: SyncConfig,
    ) -> Self {
        let resolver = AddressResolver::new(indexer.clone());
        let fetcher = TransactionFetcher::new(indexer.clone(), config.fetcher.clone());

        Self {
            indexer,
            store,
            config,
            resolver,
            fetcher,
            in_progress: Mutex::new(HashSet::new()),
            last_completed: Mutex::new(HashMap::new()),
        }
    }

    /// On-demand completer sharing this coordinator's indexer and store.
    pub fn completer(&self) -> UtxoCompleter {
        UtxoCompleter::new(self.indexer.clone(), self.store.clone())
    }

    /// Run one sync pass for a wallet.
    ///
    /// A request is rejected with `AlreadyInProgress` while another sync for
    /// the same wallet is running, and with `CooldownActive` inside the
    /// cooldown window unless `force` is set. Failures leave the persisted
    /// watermark untouched; the next pass retries from it.
    ///
    /// Events are emitted through `dispatcher` in order; the final event of
    /// every pass, successful or not, is a `Complete`-phase progress event.
    pub async fn sync_wallet(
        &self,
        wallet: &WalletIdentity,
        force: bool,
        dispatcher: &mut EventDispatcher,
    ) -> Result<SyncOutcome, WalletSyncError> {
        if !force {
            let guard = self.last_completed.lock().unwrap();
            if let Some(completed_at) = guard.get(&wallet.id) {
                if completed_at.elapsed() < self.config.cooldown {
                    return Err(WalletSyncError::CooldownActive(wallet.id.clone()));
                }
            }
        }

        // Check-and-set under one lock: at most one sync per wallet id.
        {
            let mut guard = self.in_progress.lock().unwrap();
            if !guard.insert(wallet.id.clone()) {
                return Err(WalletSyncError::AlreadyInProgress(wallet.id.clone()));
            }
        }

        info!("Starting sync for wallet {} (force: {})", wallet.id, force);
        let result = tokio::time::timeout(self.config.timeout, self.run_sync(wallet, dispatcher))
            .await
            .unwrap_or_else(|_| Err(WalletSyncError::Timeout(self.config.timeout.as_secs())));

        self.in_progress.lock().unwrap().remove(&wallet.id);

        match result {
            Ok(outcome) => {
                self.last_completed
                    .lock()
                    .unwrap()
                    .insert(wallet.id.clone(), Instant::now());
                Ok(outcome)
            }
            Err(e) => {
                warn!("Sync failed for wallet {}: {}", wallet.id, e);
                dispatcher
                    .dispatch(&SyncEvent::SyncFailed {
                        error: e.to_string(),
                    })
                    .await;
                dispatcher
                    .dispatch(&SyncEvent::Progress {
                        current: 0,
                        total: 0,
                        message: format!("Sync failed: {}", e),
                        phase: SyncPhase::Complete,
                        new_items: 0,
                    })
                    .await;
                Err(e)
            }
        }
    }

    /// The sync pass proper, free of registry and timeout concerns.
    async fn run_sync(
        &self,
        wallet: &WalletIdentity,
        dispatcher: &mut EventDispatcher,
    ) -> Result<SyncOutcome, WalletSyncError> {
        let mut tracker = SyncProgressTracker::new();

        dispatcher
            .dispatch(&SyncEvent::Progress {
                current: 0,
                total: 0,
                message: "Resolving wallet addresses".to_string(),
                phase: SyncPhase::Checking,
                new_items: 0,
            })
            .await;

        let addresses = self.resolver.resolve(wallet).await?;
        tracker.record_addresses(addresses.len());

        let checkpoint = self.store.load_checkpoint(&wallet.id).await?;
        let since_block = checkpoint.map(|c| c.last_sync_block).unwrap_or(0);

        dispatcher
            .dispatch(&SyncEvent::Progress {
                current: 0,
                total: 0,
                message: format!(
                    "Checking {} addresses for activity above block {}",
                    addresses.len(),
                    since_block
                ),
                phase: SyncPhase::Checking,
                new_items: 0,
            })
            .await;

        let discovered = self.fetcher.fetch_new_hashes(&addresses, since_block).await?;
        tracker.record_pages(discovered.pages);

        let known = self.store.known_transaction_hashes(&wallet.id).await?;
        let mut new_hashes: Vec<String> = discovered
            .hashes
            .into_iter()
            .filter(|hash| !known.contains(hash))
            .collect();
        new_hashes.sort();

        if new_hashes.is_empty() {
            // Short-circuit: no detail fetches, no UTXO rebuild.
            self.store
                .save_checkpoint(
                    &wallet.id,
                    &SyncCheckpoint {
                        last_sync_block: since_block,
                        last_full_sync: Utc::now(),
                    },
                )
                .await?;
            info!("Wallet {} is up to date at block {}", wallet.id, since_block);
            dispatcher
                .dispatch(&SyncEvent::Progress {
                    current: 0,
                    total: 0,
                    message: "Wallet is up to date".to_string(),
                    phase: SyncPhase::Complete,
                    new_items: 0,
                })
                .await;
            return Ok(SyncOutcome::UpToDate);
        }

        let total = new_hashes.len();
        dispatcher
            .dispatch(&SyncEvent::Progress {
                current: 0,
                total,
                message: format!("Downloading {} new transactions", total),
                phase: SyncPhase::Downloading,
                new_items: total,
            })
            .await;

        // Fetch details chunk by chunk so progress events interleave with
        // the fan-out instead of arriving all at once.
        let mut fetched = Vec::with_capacity(total);
        let mut skipped = 0usize;
        for chunk in new_hashes.chunks(self.config.fetcher.detail_concurrency.max(1)) {
            let (batch, batch_skipped) = self.fetcher.fetch_details(chunk).await;
            skipped += batch_skipped;
            for tx in &batch {
                tracker.record_transaction(tx.content.block_height);
                dispatcher
                    .dispatch(&SyncEvent::TransactionFetched {
                        hash: tx.content.hash.clone(),
                        block_height: tx.content.block_height,
                    })
                    .await;
            }
            fetched.extend(batch);

            dispatcher
                .dispatch(&SyncEvent::Progress {
                    current: fetched.len() + skipped,
                    total,
                    message: "Downloading transactions".to_string(),
                    phase: SyncPhase::Downloading,
                    new_items: total,
                })
                .await;
            tracker.log_progress(false);
        }
        tracker.record_skipped(skipped);

        let mut utxos = self.store.load_utxos(&wallet.id).await?;
        let builder = UtxoBuilder::new(addresses);
        let build = builder.apply(&mut utxos, &fetched);
        tracker.record_utxo_changes(build.created, build.completed, build.spent);

        let records: Vec<TransactionRecord> = fetched
            .iter()
            .map(|tx| TransactionRecord::from_content(&tx.content, &wallet.id))
            .collect();
        self.store.save_transactions(&wallet.id, &records).await?;
        self.store.save_utxos(&wallet.id, &utxos).await?;

        // The watermark never regresses, even if the indexer served stale
        // listings this pass.
        let last_sync_block = since_block.max(tracker.highest_block());
        self.store
            .save_checkpoint(
                &wallet.id,
                &SyncCheckpoint {
                    last_sync_block,
                    last_full_sync: Utc::now(),
                },
            )
            .await?;

        let stats = tracker.get_stats();
        info!("Sync completed for wallet {}: {}", wallet.id, stats.summary());

        dispatcher
            .dispatch(&SyncEvent::SyncCompleted {
                new_transactions: fetched.len(),
                new_utxos: build.created,
                last_sync_block,
            })
            .await;
        dispatcher
            .dispatch(&SyncEvent::Progress {
                current: total,
                total,
                message: "Sync complete".to_string(),
                phase: SyncPhase::Complete,
                new_items: fetched.len(),
            })
            .await;

        Ok(SyncOutcome::Completed(SyncReport {
            new_transactions: fetched.len(),
            skipped_transactions: skipped,
            new_utxos: build.created,
            completed_utxos: build.completed,
            spent_utxos: build.spent,
            last_sync_block,
            stats,
        }))
    }

    /// Sync a set of wallets in fixed-size batches with a short delay in
    /// between, bounding how many syncs hit the indexer at once. Wallets
    /// within a batch sync concurrently; they touch disjoint keyspaces.
    pub async fn sync_all(
        &self,
        wallets: &[WalletIdentity],
        force: bool,
    ) -> Vec<(String, Result<SyncOutcome, WalletSyncError>)> {
        let mut results = Vec::with_capacity(wallets.len());

        for (batch_index, batch) in wallets.chunks(self.config.batch_size.max(1)).enumerate() {
            if batch_index > 0 {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            let batch_results = futures::future::join_all(batch.iter().map(|wallet| async move {
                let mut dispatcher = EventDispatcher::new();
                dispatcher.register_handler(Box::new(LoggingEventHandler));
                let result = self.sync_wallet(wallet, force, &mut dispatcher).await;
                (wallet.id.clone(), result)
            }))
            .await;

            results.extend(batch_results);
        }

        results
    }
}
