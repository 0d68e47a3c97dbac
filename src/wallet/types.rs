use crate::indexer::{Amount, IndexerError, TransactionContent, TxInput, TxOutput};
use crate::utils::{sum_unit, LOVELACE};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a wallet as produced by the external key-derivation layer.
///
/// Key derivation, mnemonics and encryption-at-rest live outside this crate;
/// the sync engine only ever sees the resulting address pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletIdentity {
    /// Stable identifier keying all persisted collections.
    pub id: String,
    /// The wallet's own receive address.
    pub payment_address: String,
    /// Account-level address grouping all of the wallet's payment addresses.
    pub stake_address: String,
}

/// A finalized ledger transaction as persisted locally.
///
/// Immutable once stored, apart from the owning wallet id and the sync stamp
/// attached at ingestion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    /// Hash of the containing block.
    pub block: String,
    pub block_height: u64,
    pub block_time: u64,
    pub slot: u64,
    /// Fee in lovelace, decimal string.
    pub fee: String,
    /// Serialized size in bytes.
    pub size: u64,
    /// Deposit locked or returned, decimal string.
    pub deposit: String,
    pub asset_mint_or_burn_count: u64,
    pub redeemer_count: u64,
    pub withdrawal_count: u64,
    /// Wallet whose sync ingested this transaction.
    pub wallet_id: String,
    /// When this record was last written by a sync pass.
    pub last_synced: DateTime<Utc>,
}

impl TransactionRecord {
    /// Build a record from an indexer transaction summary.
    pub fn from_content(content: &TransactionContent, wallet_id: &str) -> Self {
        Self {
            hash: content.hash.clone(),
            block: content.block.clone(),
            block_height: content.block_height,
            block_time: content.block_time,
            slot: content.slot,
            fee: content.fees.clone(),
            size: content.size,
            deposit: content.deposit.clone(),
            asset_mint_or_burn_count: content.asset_mint_or_burn_count,
            redeemer_count: content.redeemer_count,
            withdrawal_count: content.withdrawal_count,
            wallet_id: wallet_id.to_string(),
            last_synced: Utc::now(),
        }
    }
}

/// Compound key identifying a transaction output. Globally unique and never
/// reused across the life of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtxoKey {
    pub tx_hash: String,
    pub output_index: u32,
}

impl UtxoKey {
    pub fn new(tx_hash: impl Into<String>, output_index: u32) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            output_index,
        }
    }
}

impl fmt::Display for UtxoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.output_index)
    }
}

/// Spend state of a UTXO.
///
/// A spent UTXO always names its spending transaction, so "spent without a
/// spender" is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SpendStatus {
    Unspent,
    Spent { tx_hash: String },
}

/// A transaction output tracked by the wallet.
///
/// Created when first observed as an output of a fetched transaction, or
/// synthesized from an input reference when the producing transaction was
/// never fetched. `block: None` marks such an incomplete record; on-demand
/// completion back-fills it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoRecord {
    pub tx_hash: String,
    pub output_index: u32,
    pub address: String,
    pub amount: Vec<Amount>,
    /// Hash of the block producing this output. `None` until the producing
    /// transaction has been observed directly.
    pub block: Option<String>,
    pub data_hash: Option<String>,
    pub inline_datum: Option<String>,
    pub reference_script_hash: Option<String>,
    pub spend: SpendStatus,
    /// True when the holding address does not belong to the wallet.
    pub external: bool,
}

impl UtxoRecord {
    /// Build an unspent record from an output of a fetched transaction.
    pub fn from_output(tx_hash: &str, block: &str, output: &TxOutput, external: bool) -> Self {
        Self {
            tx_hash: tx_hash.to_string(),
            output_index: output.output_index,
            address: output.address.clone(),
            amount: output.amount.clone(),
            block: Some(block.to_string()),
            data_hash: output.data_hash.clone(),
            inline_datum: output.inline_datum.clone(),
            reference_script_hash: output.reference_script_hash.clone(),
            spend: SpendStatus::Unspent,
            external,
        }
    }

    /// Synthesize a record from an input reference whose producing
    /// transaction is outside the fetched window. The record is spent by
    /// construction and incomplete until completion back-fills it.
    pub fn from_input(input: &TxInput, spent_in: &str, external: bool) -> Self {
        Self {
            tx_hash: input.tx_hash.clone(),
            output_index: input.output_index,
            address: input.address.clone(),
            amount: input.amount.clone(),
            block: None,
            data_hash: input.data_hash.clone(),
            inline_datum: input.inline_datum.clone(),
            reference_script_hash: input.reference_script_hash.clone(),
            spend: SpendStatus::Spent {
                tx_hash: spent_in.to_string(),
            },
            external,
        }
    }

    pub fn key(&self) -> UtxoKey {
        UtxoKey::new(self.tx_hash.clone(), self.output_index)
    }

    pub fn is_spent(&self) -> bool {
        matches!(self.spend, SpendStatus::Spent { .. })
    }

    /// Hash of the spending transaction, when spent.
    pub fn spent_in_tx(&self) -> Option<&str> {
        match &self.spend {
            SpendStatus::Spent { tx_hash } => Some(tx_hash),
            SpendStatus::Unspent => None,
        }
    }

    /// Whether the producing transaction has been observed directly.
    pub fn is_complete(&self) -> bool {
        self.block.is_some()
    }

    /// Lovelace carried by this output.
    pub fn lovelace(&self) -> Result<u128, WalletSyncError> {
        sum_unit(&self.amount, LOVELACE).map_err(WalletSyncError::AmountError)
    }
}

/// Per-wallet sync checkpoint, owned exclusively by the sync coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncCheckpoint {
    /// Highest block height already incorporated; monotonically
    /// non-decreasing across syncs.
    pub last_sync_block: u64,
    /// Completion time of the last successful sync.
    pub last_full_sync: DateTime<Utc>,
}

/// Error types for wallet synchronization
#[derive(Debug, thiserror::Error)]
pub enum WalletSyncError {
    #[error("Indexer error: {0}")]
    IndexerError(#[from] IndexerError),

    #[error("A sync is already running for wallet {0}")]
    AlreadyInProgress(String),

    #[error("Sync cooldown active for wallet {0}")]
    CooldownActive(String),

    #[error("Sync timed out after {0} seconds")]
    Timeout(u64),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Amount error: {0}")]
    AmountError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Sync error: {0}")]
    SyncError(String),
}
