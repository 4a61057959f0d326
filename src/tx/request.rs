//! Transfer input as typed by the user, and the validated request built from it

use super::fee::PriorityTier;
use crate::chain::{Cluster, LAMPORTS_PER_SOL};
use crate::display::sanitize_amount;
use crate::error::{WalletError, WalletResult};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::str::FromStr;

/// Raw form fields posted by the front end
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferForm {
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub tier: PriorityTier,
    /// Only used to build the explorer link
    #[serde(default)]
    pub network: Option<Cluster>,
}

/// A validated, immutable transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    amount: Decimal,
    lamports: u64,
    destination: String,
    tier: PriorityTier,
}

impl TransferRequest {
    /// Build a request from form input.
    ///
    /// Fails with the missing-parameters error unless the session is
    /// connected, the recipient is non-empty and the amount is a positive
    /// decimal. Amounts that do not convert to a whole, non-zero number of
    /// lamports fail with a validation error. The recipient itself is not
    /// checked here; the wallet and network decide whether it is a valid
    /// address.
    pub fn from_form(form: &TransferForm, connected: bool) -> WalletResult<Self> {
        let destination = form.recipient.trim();
        let amount = parse_amount(&sanitize_amount(&form.amount));

        match amount {
            Some(amount) if connected && !destination.is_empty() && amount > Decimal::ZERO => {
                Ok(Self {
                    lamports: sol_to_lamports(amount)?,
                    amount,
                    destination: destination.to_string(),
                    tier: form.tier,
                })
            }
            _ => Err(WalletError::missing_parameters()),
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn tier(&self) -> PriorityTier {
        self.tier
    }

    /// Amount in lamports; sub-lamport digits are dropped
    pub fn lamports(&self) -> u64 {
        self.lamports
    }
}

/// Parse a decimal amount, `None` when empty or malformed
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    Decimal::from_str(input).ok()
}

pub fn sol_to_lamports(amount: Decimal) -> WalletResult<u64> {
    amount
        .checked_mul(Decimal::from(LAMPORTS_PER_SOL))
        .map(|l| l.round_dp_with_strategy(0, RoundingStrategy::ToZero))
        .and_then(|l| l.to_u64())
        .filter(|l| *l > 0)
        .ok_or_else(|| WalletError::Validation(format!("Amount {} is out of range", amount)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(recipient: &str, amount: &str) -> TransferForm {
        TransferForm {
            recipient: recipient.to_string(),
            amount: amount.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_form_builds_request() {
        let request = TransferRequest::from_form(&form(" Dest111 ", "1.5"), true).unwrap();
        assert_eq!(request.destination(), "Dest111");
        assert_eq!(request.amount(), Decimal::new(15, 1));
        assert_eq!(request.tier(), PriorityTier::Normal);
        assert_eq!(request.lamports(), 1_500_000_000);
    }

    #[test]
    fn disconnected_session_is_missing_parameters() {
        let err = TransferRequest::from_form(&form("Dest111", "1"), false).unwrap_err();
        assert_eq!(err, WalletError::missing_parameters());
    }

    #[test]
    fn empty_or_zero_amount_is_rejected() {
        for amount in ["", "0", "0.0", "."] {
            assert!(TransferRequest::from_form(&form("Dest111", amount), true).is_err());
        }
        assert!(TransferRequest::from_form(&form("", "1"), true).is_err());
    }

    #[test]
    fn amount_is_sanitized_before_parsing() {
        let request = TransferRequest::from_form(&form("Dest111", "1.25 SOL"), true).unwrap();
        assert_eq!(request.amount(), Decimal::new(125, 2));
    }

    #[test]
    fn sub_lamport_digits_truncate() {
        assert_eq!(sol_to_lamports(Decimal::new(12345678919, 10)).unwrap(), 1_234_567_891);
        assert!(sol_to_lamports(Decimal::new(1, 10)).is_err());
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        for amount in [
            "100000000000000000000",
            "18446744073.709551616",
            "79228162514264337593543950335",
        ] {
            let err = TransferRequest::from_form(&form("Dest111", amount), true).unwrap_err();
            assert!(matches!(err, WalletError::Validation(_)));
            assert_ne!(err, WalletError::missing_parameters());
        }
        assert_eq!(sol_to_lamports(Decimal::MAX).ok(), None);
    }

    #[test]
    fn sub_lamport_amount_is_rejected_up_front() {
        let err = TransferRequest::from_form(&form("Dest111", "0.0000000001"), true).unwrap_err();
        assert!(matches!(err, WalletError::Validation(msg) if msg.contains("out of range")));
    }
}
