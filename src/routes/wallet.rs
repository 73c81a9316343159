//! # Wallet Routes
//!
//! Provider discovery, connect/disconnect, and balance display endpoints.
//! Balance responses follow the oracle's fail-safe-to-zero policy: a dead
//! indexer yields zeros, never a 5xx, so the dashboard keeps rendering.

use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::routes::strategy::{ErrorResponse, error_response};
use crate::server::AppState;
use crate::wallet::{ProviderKind, WalletHandle};

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    /// Providers whose capability marker is present in this environment
    pub providers: Vec<ProviderKind>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub provider: ProviderKind,
}

#[derive(Debug, Deserialize)]
pub struct WalletBalanceQuery {
    /// Canonical-format wallet address
    pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalanceResponse {
    pub address: String,
    /// Native gas asset balance in human-readable units
    pub native_gas: Decimal,
    /// Stable asset balance in human-readable units
    pub stable: Decimal,
}

/// List the wallet providers available for selection. An absent provider
/// is simply omitted; this endpoint never errors.
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.connector.available_providers(),
    })
}

/// Connect the chosen wallet provider and return the resulting handle.
/// On success the periodic balance refresher starts for the connected
/// address; it polls on a fixed interval and never blocks an activation.
pub async fn connect_wallet(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<WalletHandle>, (axum::http::StatusCode, Json<ErrorResponse>)> {
    info!("Wallet connect requested: {}", request.provider);
    let handle = state
        .connector
        .connect(request.provider)
        .await
        .map_err(|e| error_response(&e))?;

    let refresher = crate::balance::BalanceRefresher::spawn(
        state.oracle.clone(),
        handle.native_address.clone(),
        state.refresh_interval,
    );
    // Replacing an earlier refresher drops and aborts it.
    *state.refresher.lock() = Some(refresher);

    Ok(Json(handle))
}

/// Disconnect the current wallet session, clear persisted state, and stop
/// the balance refresher.
pub async fn disconnect_wallet(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.connector.disconnect();
    *state.refresher.lock() = None;
    Json(serde_json::json!({ "disconnected": true }))
}

/// Get display balances for an address (gas + stable assets).
pub async fn get_wallet_balance(
    State(state): State<AppState>,
    Query(query): Query<WalletBalanceQuery>,
) -> Json<WalletBalanceResponse> {
    let balances = state.oracle.fetch_balances(&query.address).await;
    Json(WalletBalanceResponse {
        address: query.address,
        native_gas: balances.native_gas,
        stable: balances.stable,
    })
}

/// Create the wallet routes
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/wallet/providers", get(list_providers))
        .route("/api/v1/wallet/connect", post(connect_wallet))
        .route("/api/v1/wallet/disconnect", post(disconnect_wallet))
        .route("/api/v1/wallet/balance", get(get_wallet_balance))
}
