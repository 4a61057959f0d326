//! Wallet session: connection state, balance and recent history
//!
//! The session is the single owner of this state. Consumers read it through
//! [`WalletSession::snapshot`] or follow changes through
//! [`WalletSession::subscribe`]. No operation returns an error; failures are
//! recorded in the snapshot and logged.

use super::WalletProvider;
use crate::chain::{ConfirmationStatus, NetworkClient, SignatureRecord, LAMPORTS_PER_SOL};
use crate::display::short_signature;
use crate::error::{ErrorView, WalletError};
use crate::metrics;

use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Number of signatures kept in the history list
pub const RECENT_TRANSACTION_LIMIT: usize = 5;

/// Shown in place of amounts the history query does not return
pub const UNKNOWN_AMOUNT: &str = "-";

/// One row of the recent transaction list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub signature: String,
    pub short_address: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub status: ConfirmationStatus,
    pub amount: String,
}

impl From<SignatureRecord> for TransactionRecord {
    fn from(record: SignatureRecord) -> Self {
        Self {
            short_address: short_signature(&record.signature),
            timestamp: record
                .block_time
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            status: record.status.unwrap_or(ConfirmationStatus::Confirmed),
            amount: UNKNOWN_AMOUNT.to_string(),
            signature: record.signature,
        }
    }
}

/// Point-in-time copy of the session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub connected: bool,
    pub adapter: Option<String>,
    pub address: String,
    /// Balance in SOL
    pub balance: f64,
    /// Newest first
    pub recent_transactions: Vec<TransactionRecord>,
    pub error: Option<ErrorView>,
    pub refreshing: bool,
}

pub struct WalletSession {
    provider: Arc<dyn WalletProvider>,
    network: Arc<dyn NetworkClient>,
    state: watch::Sender<SessionSnapshot>,
    /// Refreshes currently running
    in_flight: AtomicUsize,
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

impl WalletSession {
    pub fn new(provider: Arc<dyn WalletProvider>, network: Arc<dyn NetworkClient>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            provider,
            network,
            state,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    pub fn network(&self) -> &Arc<dyn NetworkClient> {
        &self.network
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Address of the connected wallet, `None` when disconnected
    pub async fn connected_key(&self) -> Option<Pubkey> {
        if !self.state.borrow().connected {
            return None;
        }
        self.provider.public_key().await
    }

    /// Connect the first adapter the provider enumerates, then refresh
    pub async fn connect(&self) {
        let adapters = self.provider.adapters();
        let Some(adapter) = adapters.first() else {
            warn!("Connect requested with no wallet adapters available");
            self.record_error(WalletError::Provider(
                "No wallet adapters available".to_string(),
            ));
            return;
        };

        if adapters.len() > 1 {
            debug!(
                "{} wallet adapters available, selecting {}",
                adapters.len(),
                adapter.name
            );
        }

        match self.provider.connect(&adapter.name).await {
            Ok(pubkey) => {
                info!("Session connected to {} via {}", pubkey, adapter.name);
                self.state.send_modify(|s| {
                    s.connected = true;
                    s.adapter = Some(adapter.name.clone());
                    s.address = pubkey.to_string();
                    s.error = None;
                });
                self.refresh().await;
            }
            Err(e) => {
                error!("Error connecting to wallet: {}", e);
                self.record_error(e);
            }
        }
    }

    /// Disconnect the wallet; balance and history stay as last fetched
    pub async fn disconnect(&self) {
        if let Err(e) = self.provider.disconnect().await {
            error!("Error disconnecting wallet: {}", e);
            self.record_error(e);
            return;
        }

        self.state.send_modify(|s| {
            s.connected = false;
            s.adapter = None;
            s.address.clear();
        });
        info!("Session disconnected");
    }

    /// Re-query balance and recent history. No-op when disconnected.
    pub async fn refresh(&self) {
        let Some(pubkey) = self.connected_key().await else {
            debug!("Refresh skipped, wallet not connected");
            return;
        };

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| s.refreshing = true);

        let (balance, history) = tokio::join!(
            self.network.get_balance(&pubkey),
            self.network
                .recent_signatures(&pubkey, RECENT_TRANSACTION_LIMIT)
        );

        let remaining = self.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;

        // Applied in one step so that the last refresh to finish wins.
        self.state.send_modify(|s| {
            let mut failure = None;

            match balance {
                Ok(lamports) => {
                    s.balance = lamports_to_sol(lamports);
                    metrics::record_wallet_balance(s.balance);
                }
                Err(e) => {
                    error!("Error fetching balance: {}", e);
                    failure = Some(e);
                }
            }

            match history {
                Ok(records) => {
                    s.recent_transactions = records
                        .into_iter()
                        .take(RECENT_TRANSACTION_LIMIT)
                        .map(TransactionRecord::from)
                        .collect();
                }
                Err(e) => {
                    error!("Error fetching transactions: {}", e);
                    failure = Some(e);
                }
            }

            if failure.is_some() {
                metrics::record_refresh_failure();
            }
            s.error = failure.as_ref().map(ErrorView::from);
            s.refreshing = remaining > 0;
        });
    }

    fn record_error(&self, err: WalletError) {
        self.state.send_modify(|s| s.error = Some(ErrorView::from(&err)));
    }
}
