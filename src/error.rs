//! Error types for the SendSol wallet service

use serde::Serialize;
use thiserror::Error;

/// Main error type for wallet and transfer operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    /// Missing or invalid request fields, detected before any external call
    #[error("{0}")]
    Validation(String),

    /// Connect, sign or broadcast failure reported by the wallet
    #[error("{0}")]
    Provider(String),

    /// Balance, history, blockhash or status query failure
    #[error("{0}")]
    Network(String),

    /// The network reported that the submitted transfer did not confirm
    #[error("{0}")]
    Confirmation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Discriminator handed to the presentation layer alongside the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Provider,
    Network,
    Confirmation,
    Config,
}

impl WalletError {
    pub fn missing_parameters() -> Self {
        WalletError::Validation("Missing required parameters for transaction".to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Validation(_) => ErrorKind::Validation,
            WalletError::Provider(_) => ErrorKind::Provider,
            WalletError::Network(_) => ErrorKind::Network,
            WalletError::Confirmation(_) => ErrorKind::Confirmation,
            WalletError::Config(_) => ErrorKind::Config,
        }
    }

    /// Human-readable message without the kind prefix
    pub fn message(&self) -> String {
        match self {
            WalletError::Config(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;

/// Serializable view of an error for API responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&WalletError> for ErrorView {
    fn from(err: &WalletError) -> Self {
        Self {
            kind: err.kind(),
            message: err.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(WalletError::missing_parameters().kind(), ErrorKind::Validation);
        assert_eq!(WalletError::Network("x".into()).kind(), ErrorKind::Network);
        assert_eq!(
            WalletError::Confirmation("x".into()).kind(),
            ErrorKind::Confirmation
        );
    }

    #[test]
    fn view_carries_bare_message() {
        let err = WalletError::Config("no adapters".into());
        let view = ErrorView::from(&err);
        assert_eq!(view.kind, ErrorKind::Config);
        assert_eq!(view.message, "no adapters");
        assert_eq!(err.to_string(), "Configuration error: no adapters");
    }
}
