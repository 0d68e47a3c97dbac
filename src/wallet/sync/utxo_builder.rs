//! UTXO set reconciliation.
//!
//! This module rebuilds the wallet's UTXO set from a batch of newly fetched
//! transactions and the previously persisted set. The builder is a pure
//! function over its inputs: applying the same batch twice yields the same
//! set, which is what makes retries and overlapping syncs safe.
//!
//! Reconciliation runs two passes over the batch. The output pass registers
//! every produced output before the input pass consumes anything, so a
//! transaction can never spend an output created in the same batch before
//! that output is visible.

use crate::wallet::sync::fetcher::FetchedTransaction;
use crate::wallet::types::{SpendStatus, UtxoKey, UtxoRecord};

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// How a reconciliation pass changed the UTXO set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Records created, from outputs or synthesized from input references.
    pub created: usize,
    /// Incomplete records back-filled by a direct output observation.
    pub completed: usize,
    /// Records newly marked spent.
    pub spent: usize,
}

/// Rebuilds the wallet UTXO set from fetched transactions.
pub struct UtxoBuilder {
    wallet_addresses: HashSet<String>,
}

impl UtxoBuilder {
    /// Create a builder classifying ownership against the given payment
    /// address set.
    pub fn new(wallet_addresses: HashSet<String>) -> Self {
        Self { wallet_addresses }
    }

    fn owns(&self, address: &str) -> bool {
        self.wallet_addresses.contains(address)
    }

    /// Apply a batch of fetched transactions to the UTXO set in place.
    ///
    /// The batch may arrive in any order; both passes are commutative within
    /// themselves, and the output pass completes before the input pass
    /// starts.
    pub fn apply(
        &self,
        utxos: &mut HashMap<UtxoKey, UtxoRecord>,
        transactions: &[FetchedTransaction],
    ) -> BuildOutcome {
        let mut outcome = BuildOutcome::default();

        // Output pass: register every produced output.
        for tx in transactions {
            for output in tx.outputs.iter().filter(|o| !o.collateral) {
                let key = UtxoKey::new(tx.content.hash.clone(), output.output_index);
                match utxos.get_mut(&key) {
                    None => {
                        let external = !self.owns(&output.address);
                        utxos.insert(
                            key,
                            UtxoRecord::from_output(
                                &tx.content.hash,
                                &tx.content.block,
                                output,
                                external,
                            ),
                        );
                        outcome.created += 1;
                    }
                    Some(existing) if !existing.is_complete() => {
                        // Synthesized earlier from an input reference; now the
                        // producing transaction is in hand, back-fill the true
                        // fields while preserving the spend state.
                        existing.address = output.address.clone();
                        existing.amount = output.amount.clone();
                        existing.block = Some(tx.content.block.clone());
                        existing.data_hash = output.data_hash.clone();
                        existing.inline_datum = output.inline_datum.clone();
                        existing.reference_script_hash = output.reference_script_hash.clone();
                        existing.external = !self.owns(&output.address);
                        outcome.completed += 1;
                    }
                    Some(_) => {
                        debug!("UTXO {} already known, skipping", key);
                    }
                }
            }
        }

        // Input pass: consume referenced outputs. Collateral inputs are only
        // consumed on script failure and reference inputs are never consumed,
        // so neither flips a UTXO to spent.
        for tx in transactions {
            for input in tx.inputs.iter().filter(|i| !i.collateral && !i.reference) {
                let key = UtxoKey::new(input.tx_hash.clone(), input.output_index);
                match utxos.get_mut(&key) {
                    Some(existing) => {
                        match &existing.spend {
                            SpendStatus::Spent { tx_hash } if tx_hash != &tx.content.hash => {
                                // A consistent chain spends a UTXO once; seeing
                                // two spenders means the indexer served
                                // inconsistent data. Last write wins.
                                warn!(
                                    "UTXO {} already spent in {}, overwriting with {}",
                                    key, tx_hash, tx.content.hash
                                );
                            }
                            SpendStatus::Unspent => outcome.spent += 1,
                            SpendStatus::Spent { .. } => {}
                        }
                        existing.spend = SpendStatus::Spent {
                            tx_hash: tx.content.hash.clone(),
                        };
                    }
                    None if self.owns(&input.address) => {
                        // A wallet-owned output produced before the fetched
                        // window. Record it spent; completion can back-fill
                        // the block later.
                        utxos.insert(key, UtxoRecord::from_input(input, &tx.content.hash, false));
                        outcome.created += 1;
                        outcome.spent += 1;
                    }
                    None => {
                        // Foreign input never fetched separately; keep a
                        // best-effort placeholder from the input's own data.
                        utxos.insert(key, UtxoRecord::from_input(input, &tx.content.hash, true));
                        outcome.created += 1;
                        outcome.spent += 1;
                    }
                }
            }
        }

        outcome
    }
}
