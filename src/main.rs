//! SendSol - local wallet service for sending SOL
//!
//! Connects a keypair-backed wallet, shows balance and recent transfers, and
//! submits SOL transfers with a selectable priority fee. A browser front end
//! talks to it over a small JSON API.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

mod api;
mod chain;
mod config;
mod display;
mod error;
mod metrics;
mod tx;
mod wallet;

use api::AppState;
use chain::{NetworkClient, RpcNetworkClient};
use config::Settings;
use metrics::MetricsServer;
use tx::{FeeModel, TransactionSubmitter};
use wallet::{KeypairWalletProvider, WalletSession};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting SendSol v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        "Loaded configuration for {} with {} wallet adapters",
        settings.network.cluster,
        settings.wallet.adapters.len()
    );

    // Initialize network client
    let network: Arc<dyn NetworkClient> = Arc::new(RpcNetworkClient::new(
        settings.rpc_urls(),
        settings.network.commitment.into(),
        Duration::from_millis(settings.network.confirm_poll_interval_ms),
        Duration::from_secs(settings.network.confirm_timeout_secs),
    )?);

    // Initialize wallet session
    let provider = Arc::new(KeypairWalletProvider::new(
        settings.wallet.adapters.clone(),
        network.clone(),
    ));
    let session = Arc::new(WalletSession::new(provider, network));

    let submitter = Arc::new(TransactionSubmitter::new(
        FeeModel::with_rounding(settings.fees.rounding),
        settings.network.commitment.into(),
        settings.network.cluster,
    ));
    info!("Fee rounding: {:?}", submitter.fees().rounding());

    // Start API server
    let api_handle = tokio::spawn({
        let config = settings.api.clone();
        let state = AppState {
            session: session.clone(),
            submitter: submitter.clone(),
        };
        async move {
            if let Err(e) = api::run_server(config, state).await {
                error!("API server error: {}", e);
            }
        }
    });

    // Start metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("SendSol is running");
    info!("API server: http://{}:{}", settings.api.host, settings.api.port);
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    // An in-flight transfer is not cancelled; report it so the user can
    // look it up on the explorer.
    let status = submitter.status().await;
    if status.phase == tx::TransferPhase::Submitting {
        info!("Stopping with a transfer still awaiting confirmation");
    }

    api_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("SendSol stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sendsol=debug,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
