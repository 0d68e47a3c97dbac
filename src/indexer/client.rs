//!
//! REST client for the Cardano ledger indexer.
//!
//! This module provides an async client for the indexer REST API. Every
//! request carries the per-network project credential; transient transport
//! failures and 5xx responses are retried with exponential backoff, while 4xx
//! responses are permanent. All methods are async and designed for use with
//! Tokio.

use super::types::*;
use super::LedgerIndexer;
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the per-network project credential.
const PROJECT_ID_HEADER: &str = "project_id";

/// Cap on the total time spent retrying a single request.
const RETRY_MAX_ELAPSED: Duration = Duration::from_secs(15);

/// Cardano REST indexer client
#[derive(Clone, Debug)]
pub struct BlockfrostClient {
    /// The underlying HTTP client.
    http_client: Client,
    /// Base URL of the indexer REST API for the selected network.
    base_url: String,
    /// Per-network project credential sent with every request.
    project_id: String,
}

impl BlockfrostClient {
    /// Create a new indexer client for the given network.
    ///
    /// # Errors
    /// Returns `IndexerError::Configuration` when the project credential is
    /// empty, so callers can prompt for a key instead of issuing requests
    /// that are guaranteed to be rejected.
    pub fn new(network: Network, project_id: impl Into<String>) -> Result<Self, IndexerError> {
        Self::with_base_url(network.base_url(), project_id)
    }

    /// Create a client against an explicit base URL. Used for self-hosted
    /// indexer deployments.
    pub fn with_base_url(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Result<Self, IndexerError> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(IndexerError::Configuration(
                "project credential is empty".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id,
        })
    }

    /// Execute a GET request against the indexer, retrying transient
    /// failures, and deserialize the JSON response.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, IndexerError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let policy = ExponentialBackoff {
            max_elapsed_time: Some(RETRY_MAX_ELAPSED),
            ..ExponentialBackoff::default()
        };

        backoff::future::retry(policy, || async {
            let response = self
                .http_client
                .get(&url)
                .header(PROJECT_ID_HEADER, &self.project_id)
                .query(query)
                .send()
                .await
                .map_err(|e| {
                    warn!("Transport error for {}: {}", url, e);
                    backoff::Error::transient(IndexerError::Http(e))
                })?;

            let status = response.status();
            if status.is_success() {
                let value = response
                    .json::<T>()
                    .await
                    .map_err(|e| backoff::Error::permanent(IndexerError::Http(e)))?;
                return Ok(value);
            }

            let message = Self::error_message(response).await;
            let error = match status {
                StatusCode::NOT_FOUND => IndexerError::NotFound(path.to_string()),
                StatusCode::PAYMENT_REQUIRED | StatusCode::FORBIDDEN => {
                    IndexerError::Configuration(message)
                }
                _ => IndexerError::Api {
                    status: status.as_u16(),
                    message,
                },
            };

            if status.is_server_error() {
                warn!("Indexer returned {} for {}, retrying", status, url);
                Err(backoff::Error::transient(error))
            } else {
                Err(backoff::Error::permanent(error))
            }
        })
        .await
    }

    /// Extract the indexer's error message from a non-2xx response body.
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("no message")
                .to_string(),
            Err(_) => format!("HTTP {}", status),
        }
    }
}

#[async_trait]
impl LedgerIndexer for BlockfrostClient {
    async fn account_addresses(&self, stake_address: &str) -> Result<Vec<String>, IndexerError> {
        let path = format!("accounts/{}/addresses", stake_address);
        match self.get::<Vec<AccountAddress>>(&path, &[]).await {
            Ok(rows) => Ok(rows.into_iter().map(|row| row.address).collect()),
            // A brand-new account has no observed addresses yet.
            Err(IndexerError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn address_transactions(
        &self,
        address: &str,
        from_block: Option<u64>,
        page: u32,
        count: u32,
    ) -> Result<Vec<AddressTransaction>, IndexerError> {
        let path = format!("addresses/{}/transactions", address);
        let mut query = vec![
            ("order", "asc".to_string()),
            ("count", count.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(block) = from_block {
            query.push(("from", block.to_string()));
        }

        match self.get::<Vec<AddressTransaction>>(&path, &query).await {
            Ok(rows) => Ok(rows),
            // An address with no history yet ends pagination immediately.
            Err(IndexerError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn transaction(&self, hash: &str) -> Result<TransactionContent, IndexerError> {
        self.get(&format!("txs/{}", hash), &[]).await
    }

    async fn transaction_utxos(&self, hash: &str) -> Result<TransactionUtxos, IndexerError> {
        self.get(&format!("txs/{}/utxos", hash), &[]).await
    }

    async fn account(&self, stake_address: &str) -> Result<AccountInfo, IndexerError> {
        match self
            .get::<AccountInfo>(&format!("accounts/{}", stake_address), &[])
            .await
        {
            Ok(info) => Ok(info),
            // An account the chain has never seen controls nothing.
            Err(IndexerError::NotFound(_)) => Ok(AccountInfo::unobserved(stake_address)),
            Err(e) => Err(e),
        }
    }

    async fn account_assets(&self, stake_address: &str) -> Result<Vec<Amount>, IndexerError> {
        let path = format!("accounts/{}/addresses/assets", stake_address);
        match self.get::<Vec<Amount>>(&path, &[]).await {
            Ok(rows) => Ok(rows),
            Err(IndexerError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn asset(&self, unit: &str) -> Result<AssetDetails, IndexerError> {
        self.get(&format!("assets/{}", unit), &[]).await
    }
}
