//! Wallet provider backed by Solana keypair files
//!
//! Each configured adapter names a keypair file in the standard JSON format
//! (an array of 64 bytes). Connecting loads the file; signing is done by
//! the SDK and broadcast goes through the shared network client.

use super::{AdapterInfo, WalletProvider};
use crate::chain::NetworkClient;
use crate::config::AdapterConfig;
use crate::error::{WalletError, WalletResult};

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

struct ActiveWallet {
    adapter: String,
    keypair: Arc<Keypair>,
}

pub struct KeypairWalletProvider {
    adapters: Vec<AdapterConfig>,
    network: Arc<dyn NetworkClient>,
    active: RwLock<Option<ActiveWallet>>,
}

impl KeypairWalletProvider {
    pub fn new(adapters: Vec<AdapterConfig>, network: Arc<dyn NetworkClient>) -> Self {
        Self {
            adapters,
            network,
            active: RwLock::new(None),
        }
    }

    /// Name of the connected adapter
    pub async fn connected_adapter(&self) -> Option<String> {
        self.active.read().await.as_ref().map(|a| a.adapter.clone())
    }
}

async fn load_keypair(path: &Path) -> WalletResult<Keypair> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| WalletError::Provider(format!("Failed to read keypair {:?}: {}", path, e)))?;

    let bytes: Vec<u8> = serde_json::from_str(&contents)
        .map_err(|e| WalletError::Provider(format!("Malformed keypair {:?}: {}", path, e)))?;

    Keypair::from_bytes(&bytes)
        .map_err(|e| WalletError::Provider(format!("Invalid keypair {:?}: {}", path, e)))
}

#[async_trait]
impl WalletProvider for KeypairWalletProvider {
    fn adapters(&self) -> Vec<AdapterInfo> {
        self.adapters
            .iter()
            .map(|a| AdapterInfo {
                name: a.name.clone(),
                ready: a.keypair_path.exists(),
            })
            .collect()
    }

    async fn connect(&self, adapter: &str) -> WalletResult<Pubkey> {
        let config = self
            .adapters
            .iter()
            .find(|a| a.name == adapter)
            .ok_or_else(|| WalletError::Provider(format!("Unknown wallet adapter {}", adapter)))?;

        let keypair = load_keypair(&config.keypair_path).await?;
        let pubkey = keypair.pubkey();

        *self.active.write().await = Some(ActiveWallet {
            adapter: adapter.to_string(),
            keypair: Arc::new(keypair),
        });

        info!("Wallet adapter {} connected as {}", adapter, pubkey);
        Ok(pubkey)
    }

    async fn disconnect(&self) -> WalletResult<()> {
        if let Some(active) = self.active.write().await.take() {
            info!("Wallet adapter {} disconnected", active.adapter);
        }
        Ok(())
    }

    async fn public_key(&self) -> Option<Pubkey> {
        self.active.read().await.as_ref().map(|a| a.keypair.pubkey())
    }

    async fn sign_and_send(&self, mut tx: Transaction) -> WalletResult<Signature> {
        let keypair = self
            .active
            .read()
            .await
            .as_ref()
            .map(|a| a.keypair.clone())
            .ok_or_else(|| WalletError::Provider("Wallet not connected".to_string()))?;

        let blockhash = tx.message.recent_blockhash;
        tx.try_sign(&[keypair.as_ref()], blockhash)
            .map_err(|e| WalletError::Provider(e.to_string()))?;
        debug!("Signed transfer with blockhash {}", blockhash);

        self.network.send_transaction(&tx).await
    }
}
