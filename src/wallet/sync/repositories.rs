use crate::wallet::types::{SyncCheckpoint, TransactionRecord, UtxoKey, UtxoRecord, WalletSyncError};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

/// Repository for persisted transaction records, keyed by wallet id.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Upsert records by transaction hash.
    async fn save_all(
        &self,
        wallet_id: &str,
        records: &[TransactionRecord],
    ) -> Result<(), WalletSyncError>;
    async fn load_all(&self, wallet_id: &str) -> Result<Vec<TransactionRecord>, WalletSyncError>;
    /// Hashes already persisted for the wallet; the incremental filter.
    async fn known_hashes(&self, wallet_id: &str) -> Result<HashSet<String>, WalletSyncError>;
    async fn purge(&self, wallet_id: &str) -> Result<(), WalletSyncError>;
}

/// Repository for persisted UTXO records, keyed by wallet id and
/// `(tx_hash, output_index)`.
#[async_trait]
pub trait UtxoRepository: Send + Sync {
    /// Upsert the given records into the wallet's UTXO set.
    async fn save_all(
        &self,
        wallet_id: &str,
        utxos: &HashMap<UtxoKey, UtxoRecord>,
    ) -> Result<(), WalletSyncError>;
    async fn load_all(
        &self,
        wallet_id: &str,
    ) -> Result<HashMap<UtxoKey, UtxoRecord>, WalletSyncError>;
    async fn get(
        &self,
        wallet_id: &str,
        key: &UtxoKey,
    ) -> Result<Option<UtxoRecord>, WalletSyncError>;
    async fn put(&self, wallet_id: &str, record: &UtxoRecord) -> Result<(), WalletSyncError>;
    async fn purge(&self, wallet_id: &str) -> Result<(), WalletSyncError>;
}

/// Repository for per-wallet sync checkpoints.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    async fn load(&self, wallet_id: &str) -> Result<Option<SyncCheckpoint>, WalletSyncError>;
    async fn save(
        &self,
        wallet_id: &str,
        checkpoint: &SyncCheckpoint,
    ) -> Result<(), WalletSyncError>;
    async fn purge(&self, wallet_id: &str) -> Result<(), WalletSyncError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// In-memory implementation of TransactionRepository
#[derive(Default)]
pub struct MemoryTransactionRepository {
    records: Mutex<HashMap<String, HashMap<String, TransactionRecord>>>,
}

#[async_trait]
impl TransactionRepository for MemoryTransactionRepository {
    async fn save_all(
        &self,
        wallet_id: &str,
        records: &[TransactionRecord],
    ) -> Result<(), WalletSyncError> {
        let mut guard = self.records.lock().unwrap();
        let wallet = guard.entry(wallet_id.to_string()).or_default();
        for record in records {
            wallet.insert(record.hash.clone(), record.clone());
        }
        Ok(())
    }

    async fn load_all(&self, wallet_id: &str) -> Result<Vec<TransactionRecord>, WalletSyncError> {
        let guard = self.records.lock().unwrap();
        Ok(guard
            .get(wallet_id)
            .map(|wallet| wallet.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn known_hashes(&self, wallet_id: &str) -> Result<HashSet<String>, WalletSyncError> {
        let guard = self.records.lock().unwrap();
        Ok(guard
            .get(wallet_id)
            .map(|wallet| wallet.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn purge(&self, wallet_id: &str) -> Result<(), WalletSyncError> {
        self.records.lock().unwrap().remove(wallet_id);
        Ok(())
    }
}

/// In-memory implementation of UtxoRepository
#[derive(Default)]
pub struct MemoryUtxoRepository {
    records: Mutex<HashMap<String, HashMap<UtxoKey, UtxoRecord>>>,
}

#[async_trait]
impl UtxoRepository for MemoryUtxoRepository {
    async fn save_all(
        &self,
        wallet_id: &str,
        utxos: &HashMap<UtxoKey, UtxoRecord>,
    ) -> Result<(), WalletSyncError> {
        let mut guard = self.records.lock().unwrap();
        let wallet = guard.entry(wallet_id.to_string()).or_default();
        for (key, record) in utxos {
            wallet.insert(key.clone(), record.clone());
        }
        Ok(())
    }

    async fn load_all(
        &self,
        wallet_id: &str,
    ) -> Result<HashMap<UtxoKey, UtxoRecord>, WalletSyncError> {
        let guard = self.records.lock().unwrap();
        Ok(guard.get(wallet_id).cloned().unwrap_or_default())
    }

    async fn get(
        &self,
        wallet_id: &str,
        key: &UtxoKey,
    ) -> Result<Option<UtxoRecord>, WalletSyncError> {
        let guard = self.records.lock().unwrap();
        Ok(guard.get(wallet_id).and_then(|wallet| wallet.get(key)).cloned())
    }

    async fn put(&self, wallet_id: &str, record: &UtxoRecord) -> Result<(), WalletSyncError> {
        let mut guard = self.records.lock().unwrap();
        guard
            .entry(wallet_id.to_string())
            .or_default()
            .insert(record.key(), record.clone());
        Ok(())
    }

    async fn purge(&self, wallet_id: &str) -> Result<(), WalletSyncError> {
        self.records.lock().unwrap().remove(wallet_id);
        Ok(())
    }
}

/// In-memory implementation of CheckpointRepository
#[derive(Default)]
pub struct MemoryCheckpointRepository {
    checkpoints: Mutex<HashMap<String, SyncCheckpoint>>,
}

#[async_trait]
impl CheckpointRepository for MemoryCheckpointRepository {
    async fn load(&self, wallet_id: &str) -> Result<Option<SyncCheckpoint>, WalletSyncError> {
        Ok(self.checkpoints.lock().unwrap().get(wallet_id).cloned())
    }

    async fn save(
        &self,
        wallet_id: &str,
        checkpoint: &SyncCheckpoint,
    ) -> Result<(), WalletSyncError> {
        self.checkpoints
            .lock()
            .unwrap()
            .insert(wallet_id.to_string(), checkpoint.clone());
        Ok(())
    }

    async fn purge(&self, wallet_id: &str) -> Result<(), WalletSyncError> {
        self.checkpoints.lock().unwrap().remove(wallet_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-based implementations
// ---------------------------------------------------------------------------

async fn write_json<T: serde::Serialize>(
    path: &PathBuf,
    value: &T,
) -> Result<(), WalletSyncError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            WalletSyncError::StorageError(format!("Failed to create data directory: {}", e))
        })?;
    }
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| WalletSyncError::StorageError(format!("Failed to serialize: {}", e)))?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| WalletSyncError::StorageError(format!("Failed to write {:?}: {}", path, e)))
}

async fn read_json<T: serde::de::DeserializeOwned>(
    path: &PathBuf,
) -> Result<Option<T>, WalletSyncError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| WalletSyncError::StorageError(format!("Failed to read {:?}: {}", path, e)))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| WalletSyncError::StorageError(format!("Failed to parse {:?}: {}", path, e)))?;
    Ok(Some(value))
}

async fn remove_if_exists(path: &PathBuf) -> Result<(), WalletSyncError> {
    if path.exists() {
        tokio::fs::remove_file(path).await.map_err(|e| {
            WalletSyncError::StorageError(format!("Failed to remove {:?}: {}", path, e))
        })?;
    }
    Ok(())
}

/// File-based implementation of TransactionRepository
pub struct FileTransactionRepository {
    data_dir: PathBuf,
}

impl FileTransactionRepository {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn filename(&self, wallet_id: &str) -> PathBuf {
        self.data_dir.join(format!("transactions_{}.json", wallet_id))
    }
}

#[async_trait]
impl TransactionRepository for FileTransactionRepository {
    async fn save_all(
        &self,
        wallet_id: &str,
        records: &[TransactionRecord],
    ) -> Result<(), WalletSyncError> {
        let path = self.filename(wallet_id);
        let mut by_hash: HashMap<String, TransactionRecord> =
            read_json::<Vec<TransactionRecord>>(&path)
                .await?
                .unwrap_or_default()
                .into_iter()
                .map(|r| (r.hash.clone(), r))
                .collect();
        for record in records {
            by_hash.insert(record.hash.clone(), record.clone());
        }

        let mut all: Vec<TransactionRecord> = by_hash.into_values().collect();
        all.sort_by(|a, b| (a.block_height, &a.hash).cmp(&(b.block_height, &b.hash)));
        write_json(&path, &all).await?;

        info!(
            "Saved {} transaction records for wallet {} ({} total)",
            records.len(),
            wallet_id,
            all.len()
        );
        Ok(())
    }

    async fn load_all(&self, wallet_id: &str) -> Result<Vec<TransactionRecord>, WalletSyncError> {
        Ok(read_json(&self.filename(wallet_id)).await?.unwrap_or_default())
    }

    async fn known_hashes(&self, wallet_id: &str) -> Result<HashSet<String>, WalletSyncError> {
        Ok(self
            .load_all(wallet_id)
            .await?
            .into_iter()
            .map(|r| r.hash)
            .collect())
    }

    async fn purge(&self, wallet_id: &str) -> Result<(), WalletSyncError> {
        remove_if_exists(&self.filename(wallet_id)).await
    }
}

/// File-based implementation of UtxoRepository
pub struct FileUtxoRepository {
    data_dir: PathBuf,
}

impl FileUtxoRepository {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn filename(&self, wallet_id: &str) -> PathBuf {
        self.data_dir.join(format!("utxos_{}.json", wallet_id))
    }

    async fn load_map(
        &self,
        wallet_id: &str,
    ) -> Result<HashMap<UtxoKey, UtxoRecord>, WalletSyncError> {
        Ok(read_json::<Vec<UtxoRecord>>(&self.filename(wallet_id))
            .await?
            .unwrap_or_default()
            .into_iter()
            .map(|record| (record.key(), record))
            .collect())
    }

    async fn store_map(
        &self,
        wallet_id: &str,
        utxos: &HashMap<UtxoKey, UtxoRecord>,
    ) -> Result<(), WalletSyncError> {
        let mut all: Vec<&UtxoRecord> = utxos.values().collect();
        all.sort_by(|a, b| (&a.tx_hash, a.output_index).cmp(&(&b.tx_hash, b.output_index)));
        write_json(&self.filename(wallet_id), &all).await
    }
}

#[async_trait]
impl UtxoRepository for FileUtxoRepository {
    async fn save_all(
        &self,
        wallet_id: &str,
        utxos: &HashMap<UtxoKey, UtxoRecord>,
    ) -> Result<(), WalletSyncError> {
        let mut all = self.load_map(wallet_id).await?;
        for (key, record) in utxos {
            all.insert(key.clone(), record.clone());
        }
        self.store_map(wallet_id, &all).await?;

        info!(
            "Saved {} UTXO records for wallet {} ({} total)",
            utxos.len(),
            wallet_id,
            all.len()
        );
        Ok(())
    }

    async fn load_all(
        &self,
        wallet_id: &str,
    ) -> Result<HashMap<UtxoKey, UtxoRecord>, WalletSyncError> {
        self.load_map(wallet_id).await
    }

    async fn get(
        &self,
        wallet_id: &str,
        key: &UtxoKey,
    ) -> Result<Option<UtxoRecord>, WalletSyncError> {
        Ok(self.load_map(wallet_id).await?.remove(key))
    }

    async fn put(&self, wallet_id: &str, record: &UtxoRecord) -> Result<(), WalletSyncError> {
        let mut all = self.load_map(wallet_id).await?;
        all.insert(record.key(), record.clone());
        self.store_map(wallet_id, &all).await
    }

    async fn purge(&self, wallet_id: &str) -> Result<(), WalletSyncError> {
        remove_if_exists(&self.filename(wallet_id)).await
    }
}

/// File-based implementation of CheckpointRepository
pub struct FileCheckpointRepository {
    data_dir: PathBuf,
}

impl FileCheckpointRepository {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn filename(&self, wallet_id: &str) -> PathBuf {
        self.data_dir.join(format!("checkpoint_{}.json", wallet_id))
    }
}

#[async_trait]
impl CheckpointRepository for FileCheckpointRepository {
    async fn load(&self, wallet_id: &str) -> Result<Option<SyncCheckpoint>, WalletSyncError> {
        read_json(&self.filename(wallet_id)).await
    }

    async fn save(
        &self,
        wallet_id: &str,
        checkpoint: &SyncCheckpoint,
    ) -> Result<(), WalletSyncError> {
        write_json(&self.filename(wallet_id), checkpoint).await?;
        info!(
            "Saved checkpoint for wallet {} at block {}",
            wallet_id, checkpoint.last_sync_block
        );
        Ok(())
    }

    async fn purge(&self, wallet_id: &str) -> Result<(), WalletSyncError> {
        remove_if_exists(&self.filename(wallet_id)).await
    }
}
