//! RPC network client with multi-endpoint support and automatic failover

use super::{ConfirmationStatus, NetworkClient, SignatureRecord};
use crate::error::{WalletError, WalletResult};

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_response::RpcConfirmedTransactionStatusWithSignature;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use solana_transaction_status::TransactionConfirmationStatus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Multi-endpoint wrapper with automatic failover on reads
pub struct RpcNetworkClient {
    /// Endpoint URLs, parallel to `clients`
    urls: Vec<String>,
    /// RPC clients (multiple for failover)
    clients: Vec<RpcClient>,
    /// Current active client index
    current: AtomicUsize,
    /// Commitment used for reads
    commitment: CommitmentConfig,
    /// Interval between signature status polls
    poll_interval: Duration,
    /// Upper bound on a confirmation wait
    confirm_timeout: Duration,
}

impl std::fmt::Debug for RpcNetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcNetworkClient")
            .field("urls", &self.urls)
            .field("commitment", &self.commitment)
            .finish()
    }
}

impl RpcNetworkClient {
    /// Create a new client over one or more endpoints
    pub fn new(
        urls: Vec<String>,
        commitment: CommitmentConfig,
        poll_interval: Duration,
        confirm_timeout: Duration,
    ) -> WalletResult<Self> {
        if urls.is_empty() {
            return Err(WalletError::Config("No RPC endpoints configured".to_string()));
        }

        let clients = urls
            .iter()
            .map(|url| {
                debug!("Added RPC endpoint: {}", url);
                RpcClient::new_with_commitment(url.clone(), commitment)
            })
            .collect();

        Ok(Self {
            urls,
            clients,
            current: AtomicUsize::new(0),
            commitment,
            poll_interval,
            confirm_timeout,
        })
    }

    /// Get the active client
    fn client(&self) -> &RpcClient {
        let idx = self.current.load(Ordering::Relaxed);
        &self.clients[idx % self.clients.len()]
    }

    /// URL of the active endpoint
    pub fn active_url(&self) -> &str {
        let idx = self.current.load(Ordering::Relaxed);
        &self.urls[idx % self.urls.len()]
    }

    /// Switch to next available endpoint
    fn failover(&self) {
        let current = self.current.load(Ordering::Relaxed);
        let next = (current + 1) % self.clients.len();
        self.current.store(next, Ordering::Relaxed);
        if self.clients.len() > 1 {
            warn!("RPC failover to endpoint {}", self.urls[next]);
        }
    }
}

#[async_trait]
impl NetworkClient for RpcNetworkClient {
    async fn get_balance(&self, address: &Pubkey) -> WalletResult<u64> {
        let mut last_error = None;
        for _ in 0..self.clients.len() {
            match self.client().get_balance(address).await {
                Ok(lamports) => return Ok(lamports),
                Err(e) => {
                    warn!("Failed to get balance for {}: {}", address, e);
                    last_error = Some(e.to_string());
                    self.failover();
                }
            }
        }

        Err(WalletError::Network(
            last_error.unwrap_or_else(|| "Failed to retrieve account info".to_string()),
        ))
    }

    async fn recent_signatures(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> WalletResult<Vec<SignatureRecord>> {
        let mut last_error = None;
        for _ in 0..self.clients.len() {
            let config = GetConfirmedSignaturesForAddress2Config {
                before: None,
                until: None,
                limit: Some(limit),
                commitment: Some(self.commitment),
            };
            match self
                .client()
                .get_signatures_for_address_with_config(address, config)
                .await
            {
                Ok(statuses) => {
                    return Ok(statuses.into_iter().take(limit).map(to_record).collect())
                }
                Err(e) => {
                    warn!("Failed to get signatures for {}: {}", address, e);
                    last_error = Some(e.to_string());
                    self.failover();
                }
            }
        }

        Err(WalletError::Network(
            last_error.unwrap_or_else(|| "Failed to fetch recent transactions".to_string()),
        ))
    }

    async fn latest_blockhash(&self) -> WalletResult<Hash> {
        let mut last_error = None;
        for _ in 0..self.clients.len() {
            match self.client().get_latest_blockhash().await {
                Ok(hash) => return Ok(hash),
                Err(e) => {
                    warn!("Failed to get latest blockhash: {}", e);
                    last_error = Some(e.to_string());
                    self.failover();
                }
            }
        }

        Err(WalletError::Network(
            last_error.unwrap_or_else(|| "Failed to get latest blockhash".to_string()),
        ))
    }

    async fn send_transaction(&self, tx: &Transaction) -> WalletResult<Signature> {
        // Sends are not failed over; a rejected send is reported as-is.
        let signature = self
            .client()
            .send_transaction(tx)
            .await
            .map_err(|e| WalletError::Provider(e.to_string()))?;
        info!("Transaction sent: {} via {}", signature, self.active_url());
        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> WalletResult<()> {
        let wait = async {
            loop {
                let status = self
                    .client()
                    .get_signature_status_with_commitment(signature, commitment)
                    .await
                    .map_err(|e| WalletError::Network(e.to_string()))?;

                match status {
                    Some(Ok(())) => return Ok(()),
                    Some(Err(e)) => {
                        return Err(WalletError::Confirmation(format!(
                            "Transaction failed to confirm: {}",
                            e
                        )))
                    }
                    None => {
                        debug!("Transaction {} not yet at {:?}", signature, commitment.commitment);
                        sleep(self.poll_interval).await;
                    }
                }
            }
        };

        match timeout(self.confirm_timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(WalletError::Confirmation(format!(
                "Transaction {} was not confirmed within {}s",
                signature,
                self.confirm_timeout.as_secs()
            ))),
        }
    }
}

fn to_record(status: RpcConfirmedTransactionStatusWithSignature) -> SignatureRecord {
    let confirmation = if status.err.is_some() {
        Some(ConfirmationStatus::Failed)
    } else {
        status.confirmation_status.map(|s| match s {
            TransactionConfirmationStatus::Processed => ConfirmationStatus::Processed,
            TransactionConfirmationStatus::Confirmed => ConfirmationStatus::Confirmed,
            TransactionConfirmationStatus::Finalized => ConfirmationStatus::Finalized,
        })
    };

    SignatureRecord {
        signature: status.signature,
        block_time: status.block_time,
        status: confirmation,
    }
}
