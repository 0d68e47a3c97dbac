//! Incremental ledger reconciliation engine for Cardano wallets.
//!
//! Turns remote indexer responses into a locally held, internally consistent
//! set of UTXO and transaction records, incrementally and idempotently. The
//! `wallet::sync::SyncCoordinator` is the entry point; `indexer` holds the
//! REST client and the `LedgerIndexer` seam it implements.

pub mod indexer;
pub mod utils;
pub mod wallet;
