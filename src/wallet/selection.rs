//! Simple greedy coin selection.
//!
//! Largest-first accumulation over spendable UTXOs until the target is
//! covered. Change handling, fee estimation and multi-asset selection belong
//! to a transaction builder, not here.

use crate::wallet::types::{UtxoRecord, WalletSyncError};

/// A greedy selection covering a lovelace target.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub utxos: Vec<&'a UtxoRecord>,
    /// Total lovelace across the selected UTXOs; at least the target.
    pub selected: u128,
}

/// Select spendable UTXOs covering `target_lovelace`, largest first.
///
/// Spendable means unspent, wallet-owned and complete (an incomplete record
/// may carry stale amounts copied from an input reference). Returns `None`
/// when the spendable total falls short of the target.
pub fn select_utxos(
    utxos: &[UtxoRecord],
    target_lovelace: u128,
) -> Result<Option<Selection<'_>>, WalletSyncError> {
    let mut spendable: Vec<(&UtxoRecord, u128)> = Vec::new();
    for record in utxos
        .iter()
        .filter(|u| !u.is_spent() && !u.external && u.is_complete())
    {
        spendable.push((record, record.lovelace()?));
    }
    spendable.sort_by(|a, b| b.1.cmp(&a.1));

    let mut selection = Selection {
        utxos: Vec::new(),
        selected: 0,
    };
    for (record, lovelace) in spendable {
        if selection.selected >= target_lovelace {
            break;
        }
        selection.utxos.push(record);
        selection.selected += lovelace;
    }

    if selection.selected >= target_lovelace {
        Ok(Some(selection))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::Amount;
    use crate::wallet::types::SpendStatus;

    fn utxo(tx_hash: &str, lovelace: &str) -> UtxoRecord {
        UtxoRecord {
            tx_hash: tx_hash.to_string(),
            output_index: 0,
            address: "addr1q_wallet".to_string(),
            amount: vec![Amount::lovelace(lovelace)],
            block: Some("block_a".to_string()),
            data_hash: None,
            inline_datum: None,
            reference_script_hash: None,
            spend: SpendStatus::Unspent,
            external: false,
        }
    }

    #[test]
    fn selects_largest_first_until_covered() {
        let utxos = vec![utxo("a", "1000000"), utxo("b", "5000000"), utxo("c", "2000000")];
        let selection = select_utxos(&utxos, 6_000_000).unwrap().unwrap();

        assert_eq!(selection.utxos.len(), 2);
        assert_eq!(selection.utxos[0].tx_hash, "b");
        assert_eq!(selection.utxos[1].tx_hash, "c");
        assert_eq!(selection.selected, 7_000_000);
    }

    #[test]
    fn excludes_spent_external_and_incomplete() {
        let mut spent = utxo("a", "9000000");
        spent.spend = SpendStatus::Spent {
            tx_hash: "x".to_string(),
        };
        let mut external = utxo("b", "9000000");
        external.external = true;
        let mut incomplete = utxo("c", "9000000");
        incomplete.block = None;

        let utxos = vec![spent, external, incomplete, utxo("d", "3000000")];
        let selection = select_utxos(&utxos, 1_000_000).unwrap().unwrap();
        assert_eq!(selection.utxos.len(), 1);
        assert_eq!(selection.utxos[0].tx_hash, "d");
    }

    #[test]
    fn insufficient_funds_yield_none() {
        let utxos = vec![utxo("a", "1000000")];
        assert!(select_utxos(&utxos, 2_000_000).unwrap().is_none());
    }
}
