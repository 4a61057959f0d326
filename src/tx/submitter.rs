//! Transfer submitter: one transfer at a time, end to end
//!
//! `Idle -> Submitting -> Succeeded | Failed`, and `reset()` back to `Idle`.
//! Once a transfer is handed to the wallet it runs to completion; there is
//! no cancellation and nothing is retried.

use super::fee::{FeeModel, PriorityTier};
use super::request::{TransferForm, TransferRequest};
use crate::chain::Cluster;
use crate::error::{WalletError, WalletResult};
use crate::metrics;
use crate::wallet::WalletSession;

use serde::Serialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::str::FromStr;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Called once after a transfer confirms
pub type SuccessCallback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// What the user asked for, kept for the results panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferSummary {
    pub amount: String,
    pub recipient: String,
    pub tier: PriorityTier,
    pub network: Cluster,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferStatus {
    pub phase: TransferPhase,
    pub signature: Option<String>,
    pub error: Option<WalletError>,
    pub summary: Option<TransferSummary>,
}

impl TransferStatus {
    fn idle() -> Self {
        Self {
            phase: TransferPhase::Idle,
            signature: None,
            error: None,
            summary: None,
        }
    }
}

/// Build the unsigned transfer: the compute unit price for the tier followed
/// by the system transfer. The blockhash is left for the caller to set.
pub fn build_transfer(
    payer: &Pubkey,
    request: &TransferRequest,
    fees: &FeeModel,
) -> WalletResult<Transaction> {
    let destination = Pubkey::from_str(request.destination())
        .map_err(|e| WalletError::Provider(format!("Invalid public key input: {}", e)))?;
    let instructions = [
        ComputeBudgetInstruction::set_compute_unit_price(fees.priority_fee_rate(request.tier())),
        system_instruction::transfer(payer, &destination, request.lamports()),
    ];

    Ok(Transaction::new_unsigned(Message::new(
        &instructions,
        Some(payer),
    )))
}

pub struct TransactionSubmitter {
    fees: FeeModel,
    commitment: CommitmentConfig,
    /// Cluster used for explorer links when the form names none
    default_network: Cluster,
    status: RwLock<TransferStatus>,
}

impl TransactionSubmitter {
    pub fn new(fees: FeeModel, commitment: CommitmentConfig, default_network: Cluster) -> Self {
        Self {
            fees,
            commitment,
            default_network,
            status: RwLock::new(TransferStatus::idle()),
        }
    }

    pub fn fees(&self) -> &FeeModel {
        &self.fees
    }

    pub async fn status(&self) -> TransferStatus {
        self.status.read().await.clone()
    }

    /// Validate `form` and run the transfer through the session's wallet.
    ///
    /// Validation failures and a submit while another is in flight return
    /// an error without entering `Submitting`.
    pub async fn submit(
        &self,
        form: TransferForm,
        session: &WalletSession,
        on_success: Option<SuccessCallback>,
    ) -> WalletResult<Signature> {
        let payer = session.connected_key().await;

        let request = {
            let mut status = self.status.write().await;

            if status.phase == TransferPhase::Submitting {
                warn!("Transfer rejected, another transfer is in progress");
                return Err(WalletError::Validation(
                    "A transfer is already in progress".to_string(),
                ));
            }

            let request = match TransferRequest::from_form(&form, payer.is_some()) {
                Ok(request) => request,
                Err(e) => {
                    debug!("Transfer form rejected: {}", e);
                    status.error = Some(e.clone());
                    return Err(e);
                }
            };

            *status = TransferStatus {
                phase: TransferPhase::Submitting,
                signature: None,
                error: None,
                summary: Some(TransferSummary {
                    amount: request.amount().to_string(),
                    recipient: request.destination().to_string(),
                    tier: request.tier(),
                    network: form.network.unwrap_or(self.default_network),
                }),
            };
            request
        };

        // from_form only succeeds with a connected payer
        let payer = payer.ok_or_else(WalletError::missing_parameters)?;

        metrics::record_transfer_submitted(request.tier());
        let started = Instant::now();
        let result = self.execute(&payer, &request, session).await;

        {
            let mut status = self.status.write().await;
            match &result {
                Ok(signature) => {
                    status.phase = TransferPhase::Succeeded;
                    status.signature = Some(signature.to_string());
                }
                Err(e) => {
                    status.phase = TransferPhase::Failed;
                    status.error = Some(e.clone());
                }
            }
        }

        match &result {
            Ok(signature) => {
                info!(
                    "Transfer of {} SOL to {} confirmed: {}",
                    request.amount(),
                    request.destination(),
                    signature
                );
                metrics::record_transfer_confirmed(request.tier(), started.elapsed().as_secs_f64());
                if let Some(callback) = on_success {
                    callback();
                }
            }
            Err(e) => {
                error!("Transaction error: {}", e);
                metrics::record_transfer_failed(e.kind());
            }
        }

        result
    }

    async fn execute(
        &self,
        payer: &Pubkey,
        request: &TransferRequest,
        session: &WalletSession,
    ) -> WalletResult<Signature> {
        let mut tx = build_transfer(payer, request, &self.fees)?;

        // Fetched last so the submission lands inside the blockhash window.
        let blockhash = session.network().latest_blockhash().await?;
        tx.message.recent_blockhash = blockhash;

        let signature = session.provider().sign_and_send(tx).await?;
        debug!("Transfer {} broadcast, awaiting confirmation", signature);

        session
            .network()
            .confirm_transaction(&signature, self.commitment)
            .await?;

        Ok(signature)
    }

    /// Return to `Idle`, dropping the last outcome. Ignored while a
    /// transfer is in flight; only its own outcome may end `Submitting`.
    pub async fn reset(&self) {
        let mut status = self.status.write().await;
        if status.phase == TransferPhase::Submitting {
            warn!("Reset ignored, a transfer is in progress");
            return;
        }
        *status = TransferStatus::idle();
    }
}
