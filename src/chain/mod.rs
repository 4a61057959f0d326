//! Chain module - the network side of the wallet
//!
//! This module provides:
//! - The `NetworkClient` seam every cluster query goes through
//! - An RPC-backed implementation with multi-endpoint failover
//! - Cluster naming shared by configuration and explorer links

pub mod rpc;

pub use rpc::RpcNetworkClient;

use crate::config::Commitment;
use crate::error::WalletResult;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

/// Smallest units per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Target cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    #[serde(alias = "main", alias = "mainnet-beta")]
    Mainnet,
    #[default]
    #[serde(alias = "dev")]
    Devnet,
    #[serde(alias = "test")]
    Testnet,
}

impl Cluster {
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
        }
    }

    /// Value of the `cluster` query parameter understood by the explorer
    pub fn explorer_param(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "mainnet-beta",
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
        }
    }
}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Cluster::Mainnet => "mainnet",
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
        };
        f.write_str(name)
    }
}

impl From<Commitment> for CommitmentConfig {
    fn from(commitment: Commitment) -> Self {
        match commitment {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

/// Confirmation level reported for a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Processed,
    Confirmed,
    Finalized,
    Failed,
}

/// One entry of an address's signature history, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureRecord {
    pub signature: String,
    pub block_time: Option<i64>,
    pub status: Option<ConfirmationStatus>,
}

/// Network operations the wallet relies on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Balance in lamports
    async fn get_balance(&self, address: &Pubkey) -> WalletResult<u64>;

    /// Most recent signatures for `address`, newest first, at most `limit`
    async fn recent_signatures(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> WalletResult<Vec<SignatureRecord>>;

    /// Freshness token required by every submission
    async fn latest_blockhash(&self) -> WalletResult<Hash>;

    /// Broadcast a signed transaction
    async fn send_transaction(&self, tx: &Transaction) -> WalletResult<Signature>;

    /// Wait until `signature` reaches `commitment`
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> WalletResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_accepts_short_names() {
        let cluster: Cluster = serde_json::from_str("\"main\"").unwrap();
        assert_eq!(cluster, Cluster::Mainnet);
        let cluster: Cluster = serde_json::from_str("\"test\"").unwrap();
        assert_eq!(cluster, Cluster::Testnet);
        assert_eq!(Cluster::default(), Cluster::Devnet);
    }

    #[test]
    fn mainnet_uses_beta_explorer_param() {
        assert_eq!(Cluster::Mainnet.explorer_param(), "mainnet-beta");
        assert_eq!(Cluster::Devnet.to_string(), "devnet");
    }

    #[test]
    fn commitment_maps_to_sdk_config() {
        assert_eq!(
            CommitmentConfig::from(Commitment::Finalized),
            CommitmentConfig::finalized()
        );
    }
}
