//! Wallet Synchronization Module
//!
//! This module provides all the core logic and services for reconciling a
//! wallet's local ledger state with the remote indexer. It is composed of
//! several submodules, each responsible for a specific aspect of the sync
//! process:
//!
//! - `coordinator`: The main entry point. Runs the sync state machine, owns the
//!   in-progress registry and cooldown clock, and wires together all services.
//! - `addresses`: Resolves the full payment-address set of a stake account.
//! - `fetcher`: Discovers new transaction hashes above the watermark and fetches
//!   transaction details with bounded fan-out.
//! - `utxo_builder`: Two-pass reconciliation of the UTXO set from fetched
//!   transactions.
//! - `completion`: Lazy back-fill of UTXO records first seen as input references.
//! - `events`: Event types and handler traits decoupling sync logic from
//!   progress consumers.
//! - `progress`: Tracks sync progress and produces statistics.
//! - `repositories` / `store`: Persistence traits with in-memory and file-backed
//!   implementations, composed behind the `LedgerStore` facade.

/// Resolves payment addresses from a stake account
pub mod addresses;
/// Lazy completion of UTXO records observed only as input references
pub mod completion;
/// Main coordinator for the wallet sync process
pub mod coordinator;
/// Event system for decoupled communication during sync
pub mod events;
/// Incremental hash discovery and transaction detail fetching
pub mod fetcher;
/// Tracks synchronization progress and statistics
pub mod progress;
/// Persistence repositories for transactions, UTXOs and checkpoints
pub mod repositories;
/// Facade composing the persistence repositories
pub mod store;
/// Two-pass UTXO set reconciliation
pub mod utxo_builder;

pub use coordinator::*;
