//! HTTP API consumed by the browser front end

use crate::config::ApiConfig;
use crate::display::{
    explorer_url, format_balance, max_sendable, sanitize_amount, short_address, short_hash,
};
use crate::error::{ErrorView, WalletError, WalletResult};
use crate::tx::{
    PriorityTier, SuccessCallback, TransactionSubmitter, TransferForm, TransferPhase,
    TransferStatus, TransferSummary,
};
use crate::wallet::{SessionSnapshot, WalletSession};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<WalletSession>,
    pub submitter: Arc<TransactionSubmitter>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/wallets", get(get_wallets))
        .route("/session", get(get_session))
        .route("/session/connect", post(connect))
        .route("/session/disconnect", post(disconnect))
        .route("/session/refresh", post(refresh))
        .route("/fees", get(get_fees))
        .route("/transfer", get(get_transfer).post(submit_transfer))
        .route("/transfer/reset", post(reset_transfer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP API server
pub async fn run_server(config: ApiConfig, state: AppState) -> WalletResult<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WalletError::Config(format!("bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| WalletError::Config(e.to_string()))?;

    Ok(())
}

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_wallets(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.provider().adapters())
}

async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(SessionResponse::from(state.session.snapshot()))
}

async fn connect(State(state): State<AppState>) -> impl IntoResponse {
    state.session.connect().await;
    Json(SessionResponse::from(state.session.snapshot()))
}

async fn disconnect(State(state): State<AppState>) -> impl IntoResponse {
    state.session.disconnect().await;
    Json(SessionResponse::from(state.session.snapshot()))
}

async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    state.session.refresh().await;
    Json(SessionResponse::from(state.session.snapshot()))
}

async fn get_fees(
    State(state): State<AppState>,
    Query(query): Query<FeesQuery>,
) -> impl IntoResponse {
    let tier = query
        .tier
        .as_deref()
        .map(PriorityTier::from)
        .unwrap_or_default();
    let amount = sanitize_amount(query.amount.as_deref().unwrap_or_default());
    let fees = state.submitter.fees();
    let quote = fees.quote(tier);

    Json(FeeResponse {
        tier,
        network_fee: quote.network_fee_display(),
        priority_fee_rate: quote.priority_fee_rate,
        total: fees.total(&amount, tier),
    })
}

async fn get_transfer(State(state): State<AppState>) -> impl IntoResponse {
    Json(TransferResponse::from(state.submitter.status().await))
}

async fn submit_transfer(
    State(state): State<AppState>,
    Json(form): Json<TransferForm>,
) -> impl IntoResponse {
    // The transfer gets its own task so a dropped request cannot strand it
    // in `Submitting`.
    let transfer = tokio::spawn({
        let submitter = state.submitter.clone();
        let session = state.session.clone();
        async move {
            let refreshed = session.clone();
            let on_success: SuccessCallback = Box::new(move || {
                tokio::spawn(async move { refreshed.refresh().await });
            });
            submitter.submit(form, &session, Some(on_success)).await
        }
    });

    let code = match transfer.await {
        Ok(Ok(_)) => StatusCode::OK,
        Ok(Err(WalletError::Validation(_))) => StatusCode::UNPROCESSABLE_ENTITY,
        Ok(Err(_)) => StatusCode::BAD_GATEWAY,
        Err(e) => {
            error!("Transfer task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (code, Json(TransferResponse::from(state.submitter.status().await)))
}

async fn reset_transfer(State(state): State<AppState>) -> impl IntoResponse {
    state.submitter.reset().await;
    Json(TransferResponse::from(state.submitter.status().await))
}

// Request and response types

#[derive(Debug, Deserialize)]
struct FeesQuery {
    amount: Option<String>,
    tier: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct FeeResponse {
    tier: PriorityTier,
    network_fee: String,
    priority_fee_rate: u64,
    total: String,
}

#[derive(Serialize)]
struct SessionResponse {
    #[serde(flatten)]
    snapshot: SessionSnapshot,
    short_address: String,
    balance_display: String,
    max_sendable: String,
}

impl From<SessionSnapshot> for SessionResponse {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            short_address: short_address(&snapshot.address),
            balance_display: format_balance(snapshot.balance),
            max_sendable: max_sendable(snapshot.balance),
            snapshot,
        }
    }
}

#[derive(Serialize)]
struct TransferResponse {
    phase: TransferPhase,
    signature: Option<String>,
    short_signature: Option<String>,
    explorer_url: Option<String>,
    error: Option<ErrorView>,
    summary: Option<TransferSummary>,
}

impl From<TransferStatus> for TransferResponse {
    fn from(status: TransferStatus) -> Self {
        let network = status
            .summary
            .as_ref()
            .map(|s| s.network)
            .unwrap_or_default();

        Self {
            phase: status.phase,
            short_signature: status.signature.as_deref().map(short_hash),
            explorer_url: status
                .signature
                .as_deref()
                .map(|sig| explorer_url(sig, network)),
            signature: status.signature,
            error: status.error.as_ref().map(ErrorView::from),
            summary: status.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Cluster, MockNetworkClient};
    use crate::tx::{FeeModel, RoundingMode};
    use crate::wallet::session::tests::{connecting_provider, healthy_network, GatedNetwork};
    use crate::wallet::MockWalletProvider;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use solana_sdk::commitment_config::CommitmentConfig;
    use solana_sdk::hash::Hash;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::Signature;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(provider: MockWalletProvider, network: MockNetworkClient) -> Router {
        router(AppState {
            session: Arc::new(WalletSession::new(Arc::new(provider), Arc::new(network))),
            submitter: Arc::new(TransactionSubmitter::new(
                FeeModel::with_rounding(RoundingMode::HalfUp),
                CommitmentConfig::confirmed(),
                Cluster::Devnet,
            )),
        })
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_version() {
        let app = app(MockWalletProvider::new(), MockNetworkClient::new());
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn fee_quotes() {
        let app = app(MockWalletProvider::new(), MockNetworkClient::new());

        let (_, body) = call(&app, "GET", "/fees?amount=1.5&tier=normal", None).await;
        assert_eq!(body["network_fee"], "0.000005");
        assert_eq!(body["priority_fee_rate"], 50_000);
        assert_eq!(body["total"], "1.500005");

        let (_, body) = call(&app, "GET", "/fees?amount=2&tier=high", None).await;
        assert_eq!(body["network_fee"], "0.000010");
        assert_eq!(body["total"], "2.000010");

        let (_, body) = call(&app, "GET", "/fees?tier=bogus", None).await;
        assert_eq!(body["tier"], "normal");
        assert_eq!(body["total"], "0");
    }

    #[tokio::test]
    async fn transfer_without_connection_is_unprocessable() {
        let app = app(MockWalletProvider::new(), MockNetworkClient::new());
        let form = serde_json::json!({ "recipient": Pubkey::new_unique().to_string(), "amount": "1" });

        let (status, body) = call(&app, "POST", "/transfer", Some(form)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["phase"], "idle");
        assert_eq!(body["error"]["kind"], "validation");
        assert_eq!(
            body["error"]["message"],
            "Missing required parameters for transaction"
        );
    }

    #[tokio::test]
    async fn connect_without_adapters_reports_error() {
        let mut provider = MockWalletProvider::new();
        provider.expect_adapters().returning(Vec::new);
        let app = app(provider, MockNetworkClient::new());

        let (status, body) = call(&app, "POST", "/session/connect", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], false);
        assert_eq!(body["error"]["message"], "No wallet adapters available");
    }

    #[tokio::test]
    async fn connect_send_and_reset() {
        let payer = Pubkey::new_unique();
        let mut provider = connecting_provider(payer);
        provider
            .expect_sign_and_send()
            .returning(|_| Ok(Signature::new_unique()));
        let mut network = healthy_network(4_200_000_000);
        network
            .expect_latest_blockhash()
            .returning(|| Ok(Hash::new_unique()));
        network
            .expect_confirm_transaction()
            .returning(|_, _| Ok(()));
        let app = app(provider, network);

        let (_, body) = call(&app, "POST", "/session/connect", None).await;
        assert_eq!(body["connected"], true);
        assert_eq!(body["balance_display"], "4.2000");
        assert_eq!(body["max_sendable"], "4.1900");

        let form = serde_json::json!({
            "recipient": Pubkey::new_unique().to_string(),
            "amount": "0.5",
            "tier": "low",
            "network": "testnet",
        });
        let (status, body) = call(&app, "POST", "/transfer", Some(form)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "succeeded");
        assert_eq!(body["summary"]["tier"], "low");
        assert!(body["explorer_url"]
            .as_str()
            .unwrap()
            .ends_with("?cluster=testnet"));

        let (_, body) = call(&app, "POST", "/transfer/reset", None).await;
        assert_eq!(body["phase"], "idle");
        assert!(body["signature"].is_null());
    }

    #[tokio::test]
    async fn dropped_request_does_not_strand_transfer() {
        let payer = Pubkey::new_unique();
        let mut provider = connecting_provider(payer);
        provider
            .expect_sign_and_send()
            .returning(|_| Ok(Signature::new_unique()));
        let (network, release) = GatedNetwork::new();

        let session = Arc::new(WalletSession::new(Arc::new(provider), Arc::new(network)));
        let submitter = Arc::new(TransactionSubmitter::new(
            FeeModel::new(),
            CommitmentConfig::confirmed(),
            Cluster::Devnet,
        ));
        let app = router(AppState {
            session: session.clone(),
            submitter: submitter.clone(),
        });
        session.connect().await;

        let form = serde_json::json!({ "recipient": Pubkey::new_unique().to_string(), "amount": "1" });
        let request = tokio::spawn({
            let app = app.clone();
            async move { call(&app, "POST", "/transfer", Some(form)).await }
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            while submitter.status().await.phase != TransferPhase::Submitting {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        // Client goes away mid-confirmation
        request.abort();
        assert!(request.await.unwrap_err().is_cancelled());

        release.notify_one();
        tokio::time::timeout(Duration::from_secs(5), async {
            while submitter.status().await.phase != TransferPhase::Succeeded {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let (_, body) = call(&app, "GET", "/transfer", None).await;
        assert_eq!(body["phase"], "succeeded");
        assert!(body["signature"].is_string());
    }

    #[tokio::test]
    async fn oversized_amount_is_unprocessable() {
        let payer = Pubkey::new_unique();
        let mut provider = connecting_provider(payer);
        provider.expect_sign_and_send().never();
        let app = app(provider, healthy_network(1_000_000_000));

        call(&app, "POST", "/session/connect", None).await;
        let form = serde_json::json!({
            "recipient": Pubkey::new_unique().to_string(),
            "amount": "100000000000000000000",
        });
        let (status, body) = call(&app, "POST", "/transfer", Some(form)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["phase"], "idle");
        assert_eq!(body["error"]["kind"], "validation");
    }
}
