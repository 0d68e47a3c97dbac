//! Progress tracking for wallet synchronization.
//!
//! This module provides the `SyncProgressTracker`, which records what a sync
//! pass has done so far: addresses resolved, pages walked, transaction
//! details fetched or skipped, and how the UTXO set changed. The coordinator
//! uses it to log progress at intervals and to assemble the final report.

use tracing::info;

/// Service for tracking synchronization progress
#[derive(Debug, Clone, Default)]
pub struct SyncProgressTracker {
    /// Payment addresses the sync is watching.
    addresses_resolved: usize,
    /// Transaction-listing pages walked across all addresses.
    pages_fetched: usize,
    /// Transactions whose details were fetched this pass.
    transactions_fetched: usize,
    /// Transactions skipped after a detail-fetch failure; retried next pass.
    transactions_skipped: usize,
    /// UTXO records created this pass.
    utxos_created: usize,
    /// Incomplete records back-filled by an output observation.
    utxos_completed: usize,
    /// Records flipped to spent this pass.
    utxos_spent: usize,
    /// Highest block height observed among fetched transactions.
    highest_block: u64,
    /// Count of fetched transactions at the last progress log.
    last_logged_count: usize,
}

impl SyncProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_addresses(&mut self, count: usize) {
        self.addresses_resolved = count;
    }

    pub fn record_pages(&mut self, count: usize) {
        self.pages_fetched += count;
    }

    /// Record a fetched transaction at the given block height.
    pub fn record_transaction(&mut self, block_height: u64) {
        self.transactions_fetched += 1;
        self.highest_block = self.highest_block.max(block_height);
    }

    pub fn record_skipped(&mut self, count: usize) {
        self.transactions_skipped += count;
    }

    pub fn record_utxo_changes(&mut self, created: usize, completed: usize, spent: usize) {
        self.utxos_created += created;
        self.utxos_completed += completed;
        self.utxos_spent += spent;
    }

    /// Highest block height observed so far this pass.
    pub fn highest_block(&self) -> u64 {
        self.highest_block
    }

    /// Log progress every 50 fetched transactions, or when forced.
    pub fn log_progress(&mut self, force: bool) {
        let fetched_since_last_log = self.transactions_fetched - self.last_logged_count;
        if force || fetched_since_last_log >= 50 {
            info!(
                "Sync progress: {} transactions fetched ({} skipped) up to block {}",
                self.transactions_fetched, self.transactions_skipped, self.highest_block
            );
            self.last_logged_count = self.transactions_fetched;
        }
    }

    /// Get sync statistics as a SyncStats struct
    pub fn get_stats(&self) -> SyncStats {
        SyncStats {
            addresses_resolved: self.addresses_resolved,
            pages_fetched: self.pages_fetched,
            transactions_fetched: self.transactions_fetched,
            transactions_skipped: self.transactions_skipped,
            utxos_created: self.utxos_created,
            utxos_completed: self.utxos_completed,
            utxos_spent: self.utxos_spent,
            highest_block: self.highest_block,
        }
    }
}

/// Statistics about one sync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    pub addresses_resolved: usize,
    pub pages_fetched: usize,
    pub transactions_fetched: usize,
    pub transactions_skipped: usize,
    pub utxos_created: usize,
    pub utxos_completed: usize,
    pub utxos_spent: usize,
    pub highest_block: u64,
}

impl SyncStats {
    /// Get a human-readable summary of the sync statistics
    pub fn summary(&self) -> String {
        format!(
            "{} addresses, {} pages, {} transactions ({} skipped), {} UTXOs created, {} completed, {} spent, watermark {}",
            self.addresses_resolved,
            self.pages_fetched,
            self.transactions_fetched,
            self.transactions_skipped,
            self.utxos_created,
            self.utxos_completed,
            self.utxos_spent,
            self.highest_block
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_highest_block_across_transactions() {
        let mut tracker = SyncProgressTracker::new();
        tracker.record_transaction(120);
        tracker.record_transaction(80);
        tracker.record_transaction(300);

        let stats = tracker.get_stats();
        assert_eq!(stats.transactions_fetched, 3);
        assert_eq!(stats.highest_block, 300);
    }

    #[test]
    fn summary_reflects_counts() {
        let mut tracker = SyncProgressTracker::new();
        tracker.record_addresses(2);
        tracker.record_pages(1);
        tracker.record_transaction(10);
        tracker.record_utxo_changes(2, 0, 1);

        let summary = tracker.get_stats().summary();
        assert!(summary.contains("2 addresses"));
        assert!(summary.contains("watermark 10"));
    }
}
