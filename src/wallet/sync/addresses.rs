use crate::indexer::LedgerIndexer;
use crate::wallet::{WalletIdentity, WalletSyncError};

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Resolves the full set of payment addresses belonging to a wallet.
#[derive(Clone)]
pub struct AddressResolver {
    indexer: Arc<dyn LedgerIndexer>,
}

impl AddressResolver {
    pub fn new(indexer: Arc<dyn LedgerIndexer>) -> Self {
        Self { indexer }
    }

    /// Resolve every payment address ever associated with the wallet's stake
    /// account.
    ///
    /// A freshly created, never-funded wallet has no observed addresses yet;
    /// the indexer reports that as an empty set, not an error. The wallet's
    /// own receive address is always included so its outputs classify as
    /// internal even before the indexer has seen the account.
    pub async fn resolve(
        &self,
        wallet: &WalletIdentity,
    ) -> Result<HashSet<String>, WalletSyncError> {
        let mut addresses: HashSet<String> = self
            .indexer
            .account_addresses(&wallet.stake_address)
            .await?
            .into_iter()
            .collect();
        addresses.insert(wallet.payment_address.clone());

        debug!(
            "Resolved {} payment addresses for wallet {}",
            addresses.len(),
            wallet.id
        );
        Ok(addresses)
    }
}
