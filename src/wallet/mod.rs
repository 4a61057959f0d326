//! Wallet module - the signing side of the wallet
//!
//! This module provides:
//! - The `WalletProvider` seam for connecting, signing and broadcasting
//! - A keypair-file backed provider
//! - The session that mirrors connection state, balance and history

pub mod keypair;
pub mod session;

pub use keypair::KeypairWalletProvider;
pub use session::{SessionSnapshot, WalletSession};

use crate::error::WalletResult;

use async_trait::async_trait;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

/// A wallet the provider can connect to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterInfo {
    pub name: String,
    /// Whether the backing key material is present
    pub ready: bool,
}

/// Wallet operations the session and submitter rely on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Adapters in enumeration order
    fn adapters(&self) -> Vec<AdapterInfo>;

    /// Connect the named adapter and return its address
    async fn connect(&self, adapter: &str) -> WalletResult<Pubkey>;

    async fn disconnect(&self) -> WalletResult<()>;

    /// Address of the connected adapter, if any
    async fn public_key(&self) -> Option<Pubkey>;

    /// Sign `tx` with the connected key and broadcast it
    async fn sign_and_send(&self, tx: Transaction) -> WalletResult<Signature>;
}
