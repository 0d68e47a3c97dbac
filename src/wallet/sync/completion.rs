use crate::indexer::LedgerIndexer;
use crate::wallet::sync::store::LedgerStore;
use crate::wallet::types::{UtxoKey, UtxoRecord, WalletSyncError};

use std::sync::Arc;
use tracing::{debug, info};

/// Back-fills UTXO records first observed only as input references.
///
/// Bulk sync tolerates incomplete records to bound its latency; completion is
/// invoked lazily, when a consumer inspects a UTXO directly.
#[derive(Clone)]
pub struct UtxoCompleter {
    indexer: Arc<dyn LedgerIndexer>,
    store: Arc<LedgerStore>,
}

impl UtxoCompleter {
    pub fn new(indexer: Arc<dyn LedgerIndexer>, store: Arc<LedgerStore>) -> Self {
        Self { indexer, store }
    }

    /// Complete the stored record for `key` if its producing transaction was
    /// never observed, fetching that single transaction from the indexer.
    /// A record that is already complete is returned untouched.
    pub async fn complete(
        &self,
        wallet_id: &str,
        key: &UtxoKey,
    ) -> Result<UtxoRecord, WalletSyncError> {
        let record = self
            .store
            .get_utxo(wallet_id, key)
            .await?
            .ok_or_else(|| WalletSyncError::SyncError(format!("unknown UTXO {}", key)))?;

        if record.is_complete() {
            debug!("UTXO {} already complete", key);
            return Ok(record);
        }

        let (content, utxos) = tokio::join!(
            self.indexer.transaction(&key.tx_hash),
            self.indexer.transaction_utxos(&key.tx_hash)
        );
        let (content, utxos) = (content?, utxos?);

        let output = utxos
            .outputs
            .iter()
            .find(|o| o.output_index == key.output_index)
            .ok_or_else(|| {
                WalletSyncError::SyncError(format!(
                    "transaction {} has no output at index {}",
                    key.tx_hash, key.output_index
                ))
            })?;

        let mut completed = record;
        completed.address = output.address.clone();
        completed.amount = output.amount.clone();
        completed.block = Some(content.block.clone());
        completed.data_hash = output.data_hash.clone();
        completed.inline_datum = output.inline_datum.clone();
        completed.reference_script_hash = output.reference_script_hash.clone();

        self.store.put_utxo(wallet_id, &completed).await?;
        info!("Completed UTXO {} from transaction fetch", key);
        Ok(completed)
    }
}
