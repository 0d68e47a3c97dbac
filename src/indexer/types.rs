//! Types for the REST ledger indexer integration

use serde::{Deserialize, Serialize};

/// Cardano network the indexer serves.
///
/// Each network has its own indexer base URL and its own project credential; a
/// credential issued for one network is rejected by the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Preprod,
    Preview,
}

impl Network {
    /// Base URL of the indexer REST API for this network.
    pub fn base_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://cardano-mainnet.blockfrost.io/api/v0",
            Network::Preprod => "https://cardano-preprod.blockfrost.io/api/v0",
            Network::Preview => "https://cardano-preview.blockfrost.io/api/v0",
        }
    }
}

/// A `(unit, quantity)` pair making up one entry of a value multiset.
///
/// `unit` is `"lovelace"` for the native coin, otherwise the concatenation of
/// the minting policy id and the hex-encoded asset name. `quantity` is a
/// decimal string of an unsigned integer; callers parse it into `u128` before
/// doing arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub unit: String,
    pub quantity: String,
}

impl Amount {
    pub fn new(unit: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            quantity: quantity.into(),
        }
    }

    /// Lovelace amount with the given quantity.
    pub fn lovelace(quantity: impl Into<String>) -> Self {
        Self::new(crate::utils::LOVELACE, quantity)
    }
}

/// One entry of an address transaction listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressTransaction {
    /// Hash of the transaction touching the address.
    pub tx_hash: String,
    /// Height of the block containing the transaction.
    pub block_height: u64,
    /// Timestamp of the containing block (unix seconds).
    #[serde(default)]
    pub block_time: u64,
}

/// Transaction summary as returned by `txs/{hash}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionContent {
    /// Transaction hash.
    pub hash: String,
    /// Hash of the containing block.
    pub block: String,
    /// Height of the containing block.
    pub block_height: u64,
    /// Timestamp of the containing block (unix seconds).
    pub block_time: u64,
    /// Absolute slot of the containing block.
    pub slot: u64,
    /// Fee paid, in lovelace, as a decimal string.
    pub fees: String,
    /// Serialized transaction size in bytes.
    pub size: u64,
    /// Deposit locked or returned by the transaction, as a decimal string.
    pub deposit: String,
    /// Number of assets minted or burned.
    #[serde(default)]
    pub asset_mint_or_burn_count: u64,
    /// Number of script redeemers.
    #[serde(default)]
    pub redeemer_count: u64,
    /// Number of reward withdrawals.
    #[serde(default)]
    pub withdrawal_count: u64,
}

/// An input of a transaction, referencing the output it consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    /// Address holding the consumed output.
    pub address: String,
    /// Value carried by the consumed output.
    pub amount: Vec<Amount>,
    /// Hash of the transaction that produced the consumed output.
    pub tx_hash: String,
    /// Index of the consumed output within its producing transaction.
    pub output_index: u32,
    /// Hash of the datum attached to the consumed output, if any.
    #[serde(default)]
    pub data_hash: Option<String>,
    /// Inline datum of the consumed output, if any (CBOR hex).
    #[serde(default)]
    pub inline_datum: Option<String>,
    /// Hash of the reference script attached to the consumed output, if any.
    #[serde(default)]
    pub reference_script_hash: Option<String>,
    /// Whether this is a collateral input (consumed only on script failure).
    #[serde(default)]
    pub collateral: bool,
    /// Whether this is a reference input (read, never consumed).
    #[serde(default)]
    pub reference: bool,
}

/// An output produced by a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    /// Receiving address.
    pub address: String,
    /// Value carried by the output.
    pub amount: Vec<Amount>,
    /// Index of the output within the transaction.
    pub output_index: u32,
    /// Hash of the attached datum, if any.
    #[serde(default)]
    pub data_hash: Option<String>,
    /// Inline datum, if any (CBOR hex).
    #[serde(default)]
    pub inline_datum: Option<String>,
    /// Hash of the attached reference script, if any.
    #[serde(default)]
    pub reference_script_hash: Option<String>,
    /// Whether this is a collateral return output.
    #[serde(default)]
    pub collateral: bool,
}

/// Inputs and outputs of a transaction as returned by `txs/{hash}/utxos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionUtxos {
    /// Transaction hash.
    pub hash: String,
    /// Inputs, in transaction order.
    pub inputs: Vec<TxInput>,
    /// Outputs, in transaction order.
    pub outputs: Vec<TxOutput>,
}

/// Stake account summary as returned by `accounts/{stake}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    /// The stake address itself.
    pub stake_address: String,
    /// Total lovelace controlled by the account, as a decimal string.
    pub controlled_amount: String,
    /// Whether the account is registered on chain.
    #[serde(default)]
    pub active: bool,
}

impl AccountInfo {
    /// Summary for a stake address the indexer has never observed.
    pub fn unobserved(stake_address: &str) -> Self {
        Self {
            stake_address: stake_address.to_string(),
            controlled_amount: "0".to_string(),
            active: false,
        }
    }
}

/// One payment address associated with a stake account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountAddress {
    pub address: String,
}

/// Asset details as returned by `assets/{unit}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDetails {
    /// Concatenation of policy id and hex-encoded asset name.
    pub asset: String,
    /// Minting policy id.
    pub policy_id: String,
    /// Hex-encoded asset name, absent for the empty name.
    #[serde(default)]
    pub asset_name: Option<String>,
    /// Current circulating quantity as a decimal string.
    pub quantity: String,
    /// Off-chain registry metadata, when the asset is registered.
    #[serde(default)]
    pub metadata: Option<AssetMetadata>,
}

/// Off-chain registry metadata for an asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// Error types for indexer requests.
///
/// `NotFound` is only surfaced for single-resource endpoints; collection
/// endpoints translate a 404 into an empty result before it reaches callers.
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("indexer rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("indexer project credential missing or rejected: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IndexerError {
    /// Whether the error signals a misconfigured credential rather than a
    /// transient or remote failure. Configuration errors are user-recoverable
    /// and should prompt for a key instead of a retry.
    pub fn is_configuration(&self) -> bool {
        matches!(self, IndexerError::Configuration(_))
    }
}
