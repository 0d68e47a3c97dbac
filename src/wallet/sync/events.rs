//! Event system for wallet synchronization.
//!
//! This module defines the event types, the event handler trait, and the
//! event dispatcher used throughout the sync process. The coordinator emits
//! events as it moves through a sync; registered handlers consume them for
//! logging, UI progress reporting, or forwarding over a channel. Decoupling
//! progress reporting from the sync logic keeps consumers swappable without
//! touching the pipeline.

use crate::wallet::WalletSyncError;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Phase of a sync pass, in the order a consumer observes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Resolving addresses and comparing against the local store.
    Checking,
    /// Fetching transaction details and rebuilding the UTXO set.
    Downloading,
    /// Terminal phase; every sync ends with exactly one `Complete` event.
    Complete,
}

/// Events that occur during wallet synchronization
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Ordered progress report for UI consumers.
    Progress {
        current: usize,
        total: usize,
        message: String,
        phase: SyncPhase,
        new_items: usize,
    },
    /// Details for one new transaction were fetched.
    TransactionFetched { hash: String, block_height: u64 },
    /// Sync finished and the checkpoint was persisted.
    SyncCompleted {
        new_transactions: usize,
        new_utxos: usize,
        last_sync_block: u64,
    },
    /// Sync failed; the watermark is untouched.
    SyncFailed { error: String },
}

/// Trait for handling sync events.
///
/// Implementors receive all sync events and can perform side effects or state updates.
#[async_trait]
pub trait SyncEventHandler: Send + Sync {
    /// Handle a sync event.
    ///
    /// Called for every event dispatched by the coordinator.
    async fn handle(&mut self, event: &SyncEvent) -> Result<(), WalletSyncError>;

    /// Get the name of this handler for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Event dispatcher that manages multiple event handlers.
///
/// Handlers are called in registration order for each event. This lets
/// logging, UI progress and channel forwarding be handled independently.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Box<dyn SyncEventHandler>>,
}

impl EventDispatcher {
    /// Create a new, empty event dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register a new event handler.
    pub fn register_handler(&mut self, handler: Box<dyn SyncEventHandler>) {
        self.handlers.push(handler);
    }

    /// Dispatch an event to all registered handlers.
    ///
    /// Errors from handlers are logged, but do not stop other handlers from running.
    pub async fn dispatch(&mut self, event: &SyncEvent) {
        for handler in &mut self.handlers {
            if let Err(e) = handler.handle(event).await {
                warn!("Handler {} failed to process event: {}", handler.name(), e);
                // Continue processing with other handlers
            }
        }
    }
}

/// Handler that logs sync events through `tracing`.
pub struct LoggingEventHandler;

#[async_trait]
impl SyncEventHandler for LoggingEventHandler {
    async fn handle(&mut self, event: &SyncEvent) -> Result<(), WalletSyncError> {
        match event {
            SyncEvent::Progress {
                current,
                total,
                message,
                phase,
                ..
            } => {
                info!("[{:?}] {} ({}/{})", phase, message, current, total);
            }
            SyncEvent::TransactionFetched { hash, block_height } => {
                debug!("Fetched transaction {} at height {}", hash, block_height);
            }
            SyncEvent::SyncCompleted {
                new_transactions,
                new_utxos,
                last_sync_block,
            } => {
                info!(
                    "Sync completed: {} new transactions, {} new UTXOs, watermark {}",
                    new_transactions, new_utxos, last_sync_block
                );
            }
            SyncEvent::SyncFailed { error } => {
                warn!("Sync failed: {}", error);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LoggingEventHandler"
    }
}

/// Handler that forwards every event into a Tokio channel.
///
/// Gives consumers an event stream without coupling them to the dispatcher;
/// a closed receiver is treated as "nobody is listening" rather than an
/// error, so a vanished UI never aborts a sync.
pub struct ChannelEventHandler {
    sender: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelEventHandler {
    /// Create a handler and the receiving end of its stream.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl SyncEventHandler for ChannelEventHandler {
    async fn handle(&mut self, event: &SyncEvent) -> Result<(), WalletSyncError> {
        if self.sender.send(event.clone()).is_err() {
            debug!("Event receiver dropped, discarding {:?}", event);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ChannelEventHandler"
    }
}
