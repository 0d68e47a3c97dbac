//! Local ledger store facade.
//!
//! This module provides the `LedgerStore`, which composes the transaction,
//! UTXO and checkpoint repositories behind one interface. The store holds
//! three logical collections per wallet: transactions keyed by hash, UTXOs
//! keyed by `(tx_hash, output_index)`, and the sync checkpoint. It is the
//! only thing the coordinator talks to for persistence.

use crate::wallet::sync::repositories::{
    CheckpointRepository, FileCheckpointRepository, FileTransactionRepository, FileUtxoRepository,
    MemoryCheckpointRepository, MemoryTransactionRepository, MemoryUtxoRepository,
    TransactionRepository, UtxoRepository,
};
use crate::wallet::types::{SyncCheckpoint, TransactionRecord, UtxoKey, UtxoRecord, WalletSyncError};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::info;

/// Durable per-wallet ledger state.
pub struct LedgerStore {
    transactions: Box<dyn TransactionRepository>,
    utxos: Box<dyn UtxoRepository>,
    checkpoints: Box<dyn CheckpointRepository>,
}

impl LedgerStore {
    /// Compose a store from explicit repository implementations.
    pub fn new(
        transactions: Box<dyn TransactionRepository>,
        utxos: Box<dyn UtxoRepository>,
        checkpoints: Box<dyn CheckpointRepository>,
    ) -> Self {
        Self {
            transactions,
            utxos,
            checkpoints,
        }
    }

    /// Volatile store backed by mutex-guarded maps. Used in tests and by
    /// callers that persist elsewhere.
    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryTransactionRepository::default()),
            Box::new(MemoryUtxoRepository::default()),
            Box::new(MemoryCheckpointRepository::default()),
        )
    }

    /// Durable store writing JSON files under the given data directory.
    pub fn on_disk(data_dir: PathBuf) -> Self {
        Self::new(
            Box::new(FileTransactionRepository::new(data_dir.clone())),
            Box::new(FileUtxoRepository::new(data_dir.clone())),
            Box::new(FileCheckpointRepository::new(data_dir)),
        )
    }

    pub async fn save_transactions(
        &self,
        wallet_id: &str,
        records: &[TransactionRecord],
    ) -> Result<(), WalletSyncError> {
        self.transactions.save_all(wallet_id, records).await
    }

    pub async fn load_transactions(
        &self,
        wallet_id: &str,
    ) -> Result<Vec<TransactionRecord>, WalletSyncError> {
        self.transactions.load_all(wallet_id).await
    }

    pub async fn known_transaction_hashes(
        &self,
        wallet_id: &str,
    ) -> Result<HashSet<String>, WalletSyncError> {
        self.transactions.known_hashes(wallet_id).await
    }

    pub async fn save_utxos(
        &self,
        wallet_id: &str,
        utxos: &HashMap<UtxoKey, UtxoRecord>,
    ) -> Result<(), WalletSyncError> {
        self.utxos.save_all(wallet_id, utxos).await
    }

    pub async fn load_utxos(
        &self,
        wallet_id: &str,
    ) -> Result<HashMap<UtxoKey, UtxoRecord>, WalletSyncError> {
        self.utxos.load_all(wallet_id).await
    }

    pub async fn get_utxo(
        &self,
        wallet_id: &str,
        key: &UtxoKey,
    ) -> Result<Option<UtxoRecord>, WalletSyncError> {
        self.utxos.get(wallet_id, key).await
    }

    pub async fn put_utxo(
        &self,
        wallet_id: &str,
        record: &UtxoRecord,
    ) -> Result<(), WalletSyncError> {
        self.utxos.put(wallet_id, record).await
    }

    pub async fn load_checkpoint(
        &self,
        wallet_id: &str,
    ) -> Result<Option<SyncCheckpoint>, WalletSyncError> {
        self.checkpoints.load(wallet_id).await
    }

    pub async fn save_checkpoint(
        &self,
        wallet_id: &str,
        checkpoint: &SyncCheckpoint,
    ) -> Result<(), WalletSyncError> {
        self.checkpoints.save(wallet_id, checkpoint).await
    }

    /// Bulk purge of everything held for a wallet. Invoked on wallet
    /// deletion; UTXO and transaction records are never deleted otherwise.
    pub async fn delete_wallet(&self, wallet_id: &str) -> Result<(), WalletSyncError> {
        self.transactions.purge(wallet_id).await?;
        self.utxos.purge(wallet_id).await?;
        self.checkpoints.purge(wallet_id).await?;
        info!("Purged all ledger state for wallet {}", wallet_id);
        Ok(())
    }
}
