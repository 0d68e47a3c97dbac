use cardano_ledger_sync::indexer::{BlockfrostClient, Network};
use cardano_ledger_sync::utils::format_lovelace;
use cardano_ledger_sync::wallet::balance::BalanceService;
use cardano_ledger_sync::wallet::sync::events::{EventDispatcher, LoggingEventHandler};
use cardano_ledger_sync::wallet::sync::store::LedgerStore;
use cardano_ledger_sync::wallet::sync::{SyncConfig, SyncCoordinator, SyncOutcome};
use cardano_ledger_sync::wallet::WalletIdentity;

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::time())
        .init();

    info!("Starting wallet sync service");

    let project_id = match std::env::var("INDEXER_PROJECT_ID") {
        Ok(value) => value,
        Err(_) => {
            error!("INDEXER_PROJECT_ID is not set; obtain a project credential for your network");
            return;
        }
    };
    let network = match std::env::var("CARDANO_NETWORK").as_deref() {
        Ok("mainnet") => Network::Mainnet,
        Ok("preview") => Network::Preview,
        _ => Network::Preprod,
    };
    let payment_address = std::env::var("WALLET_ADDRESS").unwrap_or_default();
    let stake_address = match std::env::var("WALLET_STAKE_ADDRESS") {
        Ok(value) => value,
        Err(_) => {
            error!("WALLET_STAKE_ADDRESS is not set");
            return;
        }
    };
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

    let indexer = match BlockfrostClient::new(network, project_id) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create indexer client: {}", e);
            return;
        }
    };
    info!("Created indexer client for {:?}", network);

    let store = Arc::new(LedgerStore::on_disk(PathBuf::from(data_dir)));
    let coordinator = SyncCoordinator::new(indexer.clone(), store.clone(), SyncConfig::default());

    let wallet = WalletIdentity {
        id: stake_address.clone(),
        payment_address,
        stake_address: stake_address.clone(),
    };

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register_handler(Box::new(LoggingEventHandler));

    match coordinator.sync_wallet(&wallet, true, &mut dispatcher).await {
        Ok(SyncOutcome::Completed(report)) => {
            info!(
                "Synced {} new transactions up to block {}",
                report.new_transactions, report.last_sync_block
            );
        }
        Ok(SyncOutcome::UpToDate) => {
            info!("Wallet already up to date");
        }
        Err(e) => {
            error!("Failed to sync wallet: {}", e);
            return;
        }
    }

    let balances = BalanceService::new(indexer, store);
    match balances.local_balance(&wallet.id).await {
        Ok(lovelace) => info!("Wallet balance: {} ADA", format_lovelace(lovelace)),
        Err(e) => error!("Failed to read wallet balance: {}", e),
    }
}
