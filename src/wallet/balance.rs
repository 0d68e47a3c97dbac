//! Account balance and native-asset queries.
//!
//! Balances come from two places: the indexer's account summary (the chain's
//! view) and the local UTXO set (the wallet's view). For a wallet whose
//! activity is fully reconciled the two agree; comparing them is a cheap
//! consistency probe.

use crate::indexer::{Amount, AssetMetadata, LedgerIndexer};
use crate::utils::parse_quantity;
use crate::wallet::sync::store::LedgerStore;
use crate::wallet::types::WalletSyncError;

use std::sync::Arc;
use tracing::{debug, warn};

/// Display-ready information about one asset unit.
#[derive(Debug, Clone)]
pub struct AssetInfo {
    pub unit: String,
    /// Registry name when available, otherwise the decoded on-chain asset
    /// name, otherwise the unit itself.
    pub name: String,
    pub decimals: u32,
    pub image: Option<String>,
}

/// Balance queries over the indexer and the local ledger store.
#[derive(Clone)]
pub struct BalanceService {
    indexer: Arc<dyn LedgerIndexer>,
    store: Arc<LedgerStore>,
}

impl BalanceService {
    pub fn new(indexer: Arc<dyn LedgerIndexer>, store: Arc<LedgerStore>) -> Self {
        Self { indexer, store }
    }

    /// Lovelace controlled by the stake account, as reported by the indexer.
    pub async fn account_balance(&self, stake_address: &str) -> Result<u128, WalletSyncError> {
        let account = self.indexer.account(stake_address).await?;
        parse_quantity(&account.controlled_amount).map_err(WalletSyncError::AmountError)
    }

    /// Lovelace held by the wallet's unspent, wallet-owned UTXOs in the
    /// local store.
    pub async fn local_balance(&self, wallet_id: &str) -> Result<u128, WalletSyncError> {
        let utxos = self.store.load_utxos(wallet_id).await?;
        let mut total = 0u128;
        for record in utxos.values().filter(|u| !u.is_spent() && !u.external) {
            total = total
                .checked_add(record.lovelace()?)
                .ok_or_else(|| WalletSyncError::AmountError("balance overflow".to_string()))?;
        }
        Ok(total)
    }

    /// Native-asset balances across all addresses of the stake account.
    pub async fn native_assets(&self, stake_address: &str) -> Result<Vec<Amount>, WalletSyncError> {
        Ok(self.indexer.account_assets(stake_address).await?)
    }

    /// Display information for an asset unit.
    ///
    /// Metadata is best-effort: any indexer failure degrades to defaults
    /// derived from the unit instead of surfacing an error.
    pub async fn asset_info(&self, unit: &str) -> AssetInfo {
        match self.indexer.asset(unit).await {
            Ok(details) => {
                let metadata = details.metadata.unwrap_or_else(AssetMetadata::default);
                let name = metadata
                    .name
                    .or_else(|| details.asset_name.as_deref().and_then(decode_asset_name))
                    .unwrap_or_else(|| unit.to_string());
                AssetInfo {
                    unit: unit.to_string(),
                    name,
                    decimals: metadata.decimals.unwrap_or(0),
                    image: metadata.logo,
                }
            }
            Err(e) => {
                warn!("Asset lookup failed for {}: {}, using defaults", unit, e);
                let name = fallback_asset_name(unit);
                debug!("Falling back to asset name {:?}", name);
                AssetInfo {
                    unit: unit.to_string(),
                    name,
                    decimals: 0,
                    image: None,
                }
            }
        }
    }
}

/// Decode a hex asset name into UTF-8 when it is printable.
fn decode_asset_name(asset_name_hex: &str) -> Option<String> {
    let bytes = hex::decode(asset_name_hex).ok()?;
    let name = String::from_utf8(bytes).ok()?;
    if name.is_empty() { None } else { Some(name) }
}

/// Best-effort display name when no metadata is reachable: the asset-name
/// suffix of the unit, decoded if printable.
fn fallback_asset_name(unit: &str) -> String {
    // Policy ids are 28 bytes, 56 hex characters; the rest is the asset name.
    if let Some(name) = unit.get(56..).and_then(decode_asset_name) {
        return name;
    }
    unit.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_printable_asset_names() {
        // "TestToken"
        assert_eq!(
            decode_asset_name("54657374546f6b656e").as_deref(),
            Some("TestToken")
        );
        assert_eq!(decode_asset_name(""), None);
        assert_eq!(decode_asset_name("zz"), None);
    }

    #[test]
    fn fallback_prefers_decoded_suffix() {
        let unit = format!("{}{}", "ab".repeat(28), "54657374546f6b656e");
        assert_eq!(fallback_asset_name(&unit), "TestToken");
        assert_eq!(fallback_asset_name("lovelace"), "lovelace");
    }
}
