//! Indexer integration module for the Cardano ledger
//!
//! This module provides the client and types for interacting with a REST
//! ledger indexer. The indexer tracks blockchain state and answers
//! account-to-addresses, address-to-transactions and transaction-to-UTXO
//! queries; it never participates in consensus.

/// REST client for the ledger indexer
mod client;
/// Type definitions for indexer data structures
mod types;

pub use client::BlockfrostClient;
pub use types::*;

use async_trait::async_trait;

/// Query surface of the ledger indexer consumed by the sync engine.
///
/// `BlockfrostClient` is the production implementation; tests drive the sync
/// pipeline through in-memory fakes. Implementations own the "empty versus
/// error" distinction: a 404 on a collection endpoint must come back as an
/// empty result, never as an error.
#[async_trait]
pub trait LedgerIndexer: Send + Sync {
    /// All payment addresses ever associated with a stake account. Empty for
    /// an account the indexer has not observed yet.
    async fn account_addresses(&self, stake_address: &str) -> Result<Vec<String>, IndexerError>;

    /// One page of transactions touching an address, in ascending block
    /// order. `from_block` bounds the query to blocks at or above the given
    /// height; pages are 1-based. An unobserved address yields an empty page.
    async fn address_transactions(
        &self,
        address: &str,
        from_block: Option<u64>,
        page: u32,
        count: u32,
    ) -> Result<Vec<AddressTransaction>, IndexerError>;

    /// Summary of a single transaction.
    async fn transaction(&self, hash: &str) -> Result<TransactionContent, IndexerError>;

    /// Inputs and outputs of a single transaction.
    async fn transaction_utxos(&self, hash: &str) -> Result<TransactionUtxos, IndexerError>;

    /// Stake account summary, including the controlled lovelace amount.
    /// An unobserved account reports a zero balance.
    async fn account(&self, stake_address: &str) -> Result<AccountInfo, IndexerError>;

    /// Native-asset balances across all addresses of a stake account.
    async fn account_assets(&self, stake_address: &str) -> Result<Vec<Amount>, IndexerError>;

    /// Details and registry metadata for a single asset unit.
    async fn asset(&self, unit: &str) -> Result<AssetDetails, IndexerError>;
}
