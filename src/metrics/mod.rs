//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Transfer submissions, confirmations and failures
//! - Confirmation latency
//! - Wallet balance and refresh errors

use crate::error::{ErrorKind, WalletResult};
use crate::tx::PriorityTier;

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter,
    CounterVec, Encoder, Gauge, HistogramVec, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    // Transfer metrics
    pub static ref TRANSFERS_SUBMITTED: CounterVec = register_counter_vec!(
        "sendsol_transfers_submitted_total",
        "Total transfers handed to the wallet",
        &["tier"]
    ).unwrap();

    pub static ref TRANSFERS_CONFIRMED: CounterVec = register_counter_vec!(
        "sendsol_transfers_confirmed_total",
        "Total transfers confirmed",
        &["tier"]
    ).unwrap();

    pub static ref TRANSFERS_FAILED: CounterVec = register_counter_vec!(
        "sendsol_transfers_failed_total",
        "Total transfers failed by error kind",
        &["kind"]
    ).unwrap();

    pub static ref CONFIRMATION_LATENCY: HistogramVec = register_histogram_vec!(
        "sendsol_confirmation_latency_seconds",
        "Time from submission to confirmation",
        &["tier"],
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]
    ).unwrap();

    // Wallet metrics
    pub static ref WALLET_BALANCE: Gauge = register_gauge!(
        "sendsol_wallet_balance_sol",
        "Connected wallet balance in SOL"
    ).unwrap();

    pub static ref REFRESH_FAILURES: Counter = register_counter!(
        "sendsol_refresh_failures_total",
        "Total failed balance or history refreshes"
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> WalletResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::error::WalletError::Config(format!("bind {}: {}", addr, e)))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| crate::error::WalletError::Config(e.to_string()))?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::Provider => "provider",
        ErrorKind::Network => "network",
        ErrorKind::Confirmation => "confirmation",
        ErrorKind::Config => "config",
    }
}

// Helper functions to record metrics

pub fn record_transfer_submitted(tier: PriorityTier) {
    TRANSFERS_SUBMITTED.with_label_values(&[tier.as_str()]).inc();
}

pub fn record_transfer_confirmed(tier: PriorityTier, latency_secs: f64) {
    TRANSFERS_CONFIRMED.with_label_values(&[tier.as_str()]).inc();
    CONFIRMATION_LATENCY
        .with_label_values(&[tier.as_str()])
        .observe(latency_secs);
}

pub fn record_transfer_failed(kind: ErrorKind) {
    TRANSFERS_FAILED.with_label_values(&[kind_label(kind)]).inc();
}

pub fn record_wallet_balance(balance_sol: f64) {
    WALLET_BALANCE.set(balance_sol);
}

pub fn record_refresh_failure() {
    REFRESH_FAILURES.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_by_label() {
        let before = TRANSFERS_FAILED.with_label_values(&["confirmation"]).get();
        record_transfer_failed(ErrorKind::Confirmation);
        let after = TRANSFERS_FAILED.with_label_values(&["confirmation"]).get();
        assert!(after >= before + 1.0);
    }

    #[tokio::test]
    async fn handler_renders_text_format() {
        record_transfer_submitted(PriorityTier::High);
        let body = metrics_handler().await.unwrap();
        assert!(body.contains("sendsol_transfers_submitted_total"));
    }
}
