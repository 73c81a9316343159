//! # Server Module
//!
//! HTTP server setup and route configuration for the activation gateway.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::backend::{BackendApi, HttpBackendClient};
use crate::balance::{BalanceOracle, HttpBalanceIndexer};
use crate::cache::{QueryCacheCoordinator, QueryKey, Refetcher};
use crate::config::CONFIG;
use crate::grant::GrantService;
use crate::orchestrator::ActivationOrchestrator;
use crate::routes::{health::ping, strategy, wallet};
use crate::wallet::{
    BridgeWalletProvider, InMemorySessionStore, ProviderKind, WalletConnector, WalletProvider,
};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ActivationOrchestrator>,
    pub connector: Arc<WalletConnector>,
    pub oracle: Arc<BalanceOracle>,
    pub cache: Arc<QueryCacheCoordinator>,
    /// Periodic refresher for the connected wallet, if any. Started on
    /// connect, stopped on disconnect; independent of in-flight
    /// activations.
    pub refresher: Arc<parking_lot::Mutex<Option<crate::balance::BalanceRefresher>>>,
    /// Refresh interval for the wallet balance poller
    pub refresh_interval: std::time::Duration,
}

/// Refetcher that pulls fresh view data from the strategy backend.
struct BackendRefetcher {
    client: reqwest::Client,
    base_url: String,
}

#[async_trait::async_trait]
impl Refetcher for BackendRefetcher {
    async fn refetch(&self, key: QueryKey) -> Option<serde_json::Value> {
        let path = match key {
            QueryKey::ActiveStrategies(env) => {
                format!("/api/v1/plans?environment={env:?}").to_lowercase()
            }
            QueryKey::PortfolioOverview => "/api/v1/portfolio/overview".to_string(),
            QueryKey::RecentActivity => "/api/v1/activity/recent".to_string(),
        };
        let url = format!("{}{}", self.base_url, path);
        match self.client.get(&url).send().await {
            Ok(response) => response.json().await.ok(),
            Err(e) => {
                tracing::warn!("Refetch of {:?} failed: {}", key, e);
                None
            }
        }
    }
}

/// Assemble the application state from configuration.
pub fn build_state() -> AppState {
    let indexer = Arc::new(HttpBalanceIndexer::new(CONFIG.indexer_base_url.clone()));
    let oracle = Arc::new(BalanceOracle::new(
        indexer,
        CONFIG.balances.stable_denom.clone(),
        CONFIG.balances.native_gas_symbol.clone(),
    ));

    let backend: Arc<dyn BackendApi> =
        Arc::new(HttpBackendClient::new(CONFIG.backend_base_url.clone()));

    let providers: Vec<Arc<dyn WalletProvider>> = ProviderKind::ALL
        .into_iter()
        .map(|kind| Arc::new(BridgeWalletProvider::from_env(kind)) as Arc<dyn WalletProvider>)
        .collect();

    let connector = Arc::new(WalletConnector::new(
        providers,
        CONFIG.chain.chain_id.clone(),
        CONFIG.chain.bech32_hrp.clone(),
        std::time::Duration::from_secs(CONFIG.balances.address_timeout_seconds),
        Arc::new(InMemorySessionStore::default()),
    ));

    let grants = Arc::new(GrantService::new(
        Arc::clone(&oracle),
        Arc::clone(&backend),
        CONFIG.grants.operator_grantee.clone(),
        CONFIG.grants.expiry_seconds,
        CONFIG.grants.management_fee_rate,
    ));

    let cache = Arc::new(QueryCacheCoordinator::new(Arc::new(BackendRefetcher {
        client: reqwest::Client::new(),
        base_url: CONFIG.backend_base_url.clone(),
    })));

    let orchestrator = Arc::new(ActivationOrchestrator::new(
        Arc::clone(&connector),
        grants,
        backend,
        Arc::clone(&cache),
        CONFIG.chain.bech32_hrp.clone(),
    ));

    AppState {
        orchestrator,
        connector,
        oracle,
        cache,
        refresher: Arc::new(parking_lot::Mutex::new(None)),
        refresh_interval: std::time::Duration::from_secs(CONFIG.balances.refresh_seconds),
    }
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let origins = CONFIG
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<axum::http::HeaderValue>().ok())
        .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::ORIGIN,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    Router::new()
        .route("/ping", get(ping))
        .merge(wallet::create_routes())
        .merge(strategy::create_routes())
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Starts the activation gateway HTTP server.
pub async fn start() {
    CONFIG
        .validate()
        .expect("Invalid configuration, refusing to start");

    let state = build_state();

    // On startup, attempt to rehydrate a persisted wallet session from the
    // stored provider kind only.
    if let Some(handle) = state.connector.rehydrate().await {
        info!("Rehydrated wallet session for {}", handle.native_address);
    }

    let app = build_router(state);

    let addr = std::net::SocketAddr::new(
        CONFIG
            .server
            .host
            .parse()
            .unwrap_or_else(|_| std::net::IpAddr::from([127, 0, 0, 1])),
        CONFIG.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address - port may already be in use");

    info!("Activation gateway listening on http://{}", addr);
    info!("Health check available at http://{}/ping", addr);
    info!("Chain: {} (hrp {})", CONFIG.chain.chain_id, CONFIG.chain.bech32_hrp);

    axum::serve(listener, app).await.unwrap();
}
