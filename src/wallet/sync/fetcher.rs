//! Incremental transaction discovery and detail fetching.
//!
//! The fetcher walks the indexer's per-address transaction listings in
//! ascending order from the wallet's watermark, unions the hashes it finds,
//! and fetches full details (summary plus inputs/outputs) for whatever the
//! caller decides is new. Listing pages and detail fetches are independent
//! network calls, so both are issued with bounded concurrent fan-out.

use crate::indexer::{LedgerIndexer, TransactionContent, TxInput, TxOutput};
use crate::wallet::WalletSyncError;

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration for the transaction fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Listing page size; a page shorter than this ends pagination.
    pub page_size: u32,
    /// Concurrent per-address pagination walks.
    pub address_concurrency: usize,
    /// Concurrent transaction detail fetches.
    pub detail_concurrency: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            address_concurrency: 4,
            detail_concurrency: 8,
        }
    }
}

/// A transaction with its resolved inputs and outputs, ready for
/// reconciliation.
#[derive(Debug, Clone)]
pub struct FetchedTransaction {
    pub content: TransactionContent,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

/// Result of a hash-discovery sweep across all wallet addresses.
#[derive(Debug, Default)]
pub struct DiscoveredHashes {
    /// Deduplicated union of transaction hashes across addresses.
    pub hashes: HashSet<String>,
    /// Listing pages walked, for progress accounting.
    pub pages: usize,
}

/// Fetches new transactions from the ledger indexer.
#[derive(Clone)]
pub struct TransactionFetcher {
    indexer: Arc<dyn LedgerIndexer>,
    config: FetcherConfig,
}

impl TransactionFetcher {
    pub fn new(indexer: Arc<dyn LedgerIndexer>, config: FetcherConfig) -> Self {
        Self { indexer, config }
    }

    /// Discover transaction hashes touching any of the given addresses at
    /// blocks above `since_block`.
    ///
    /// Each address is paged in ascending order until a short page or a 404
    /// ends it; addresses are walked concurrently. The result still contains
    /// hashes the store may already know; the caller filters those out.
    pub async fn fetch_new_hashes(
        &self,
        addresses: &HashSet<String>,
        since_block: u64,
    ) -> Result<DiscoveredHashes, WalletSyncError> {
        let from_block = if since_block > 0 {
            Some(since_block + 1)
        } else {
            None
        };

        let per_address: Vec<DiscoveredHashes> = stream::iter(addresses.iter().cloned())
            .map(|address| async move { self.paginate_address(&address, from_block).await })
            .buffer_unordered(self.config.address_concurrency)
            .try_collect()
            .await?;

        let mut discovered = DiscoveredHashes::default();
        for result in per_address {
            discovered.hashes.extend(result.hashes);
            discovered.pages += result.pages;
        }

        debug!(
            "Discovered {} transaction hashes across {} addresses ({} pages)",
            discovered.hashes.len(),
            addresses.len(),
            discovered.pages
        );
        Ok(discovered)
    }

    /// Walk one address's transaction listing until exhaustion.
    async fn paginate_address(
        &self,
        address: &str,
        from_block: Option<u64>,
    ) -> Result<DiscoveredHashes, WalletSyncError> {
        let mut discovered = DiscoveredHashes::default();
        let mut page = 1u32;

        loop {
            let rows = self
                .indexer
                .address_transactions(address, from_block, page, self.config.page_size)
                .await?;
            discovered.pages += 1;

            let row_count = rows.len();
            for row in rows {
                discovered.hashes.insert(row.tx_hash);
            }

            if row_count < self.config.page_size as usize {
                break;
            }
            page += 1;
        }

        Ok(discovered)
    }

    /// Fetch summary and inputs/outputs for each hash, concurrently.
    ///
    /// A failure on one transaction is logged and skipped: the hash stays
    /// absent from the store and is re-discovered by the next sync pass.
    /// Returns the fetched transactions in ascending block order plus the
    /// number skipped.
    pub async fn fetch_details(
        &self,
        hashes: &[String],
    ) -> (Vec<FetchedTransaction>, usize) {
        let results: Vec<Option<FetchedTransaction>> = stream::iter(hashes.iter().cloned())
            .map(|hash| async move {
                match self.fetch_detail(&hash).await {
                    Ok(tx) => Some(tx),
                    Err(e) => {
                        warn!(
                            "Failed to fetch transaction {}: {}, retrying next sync",
                            hash, e
                        );
                        None
                    }
                }
            })
            .buffer_unordered(self.config.detail_concurrency)
            .collect()
            .await;

        let skipped = results.iter().filter(|r| r.is_none()).count();
        let mut fetched: Vec<FetchedTransaction> = results.into_iter().flatten().collect();
        fetched.sort_by(|a, b| {
            (a.content.block_height, &a.content.hash).cmp(&(b.content.block_height, &b.content.hash))
        });

        (fetched, skipped)
    }

    /// Fetch one transaction's summary and UTXO listing as a concurrent pair.
    async fn fetch_detail(&self, hash: &str) -> Result<FetchedTransaction, WalletSyncError> {
        let (content, utxos) = tokio::join!(
            self.indexer.transaction(hash),
            self.indexer.transaction_utxos(hash)
        );
        let (content, utxos) = (content?, utxos?);

        Ok(FetchedTransaction {
            content,
            inputs: utxos.inputs,
            outputs: utxos.outputs,
        })
    }
}
