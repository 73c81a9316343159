use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::orchestrator::types::{Frequency, RiskLevel, StrategyKind};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Finalized strategy-creation request as the backend expects it: chain id
/// already canonical, recipient already substituted when the user opted to
/// receive at their own address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyCreatePayload {
    pub amount: Decimal,
    pub frequency: Frequency,
    pub risk_level: RiskLevel,
    pub token_symbol: String,
    pub strategy_kind: StrategyKind,
    pub chain_id: String,
    pub user_wallet_address: String,
    pub recipient_address: String,
    pub slippage: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedStrategy {
    pub plan_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Register a granter address with the backend after a successful
    /// grant broadcast.
    async fn register_address(&self, address: &str) -> Result<(), BackendError>;

    /// Create the strategy plan. Exactly one call per successful
    /// activation, always after `register_address`.
    async fn create_strategy(
        &self,
        payload: &StrategyCreatePayload,
    ) -> Result<CreatedStrategy, BackendError>;
}

pub struct HttpBackendClient {
    client: Client,
    base_url: String,
}

impl HttpBackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl BackendApi for HttpBackendClient {
    async fn register_address(&self, address: &str) -> Result<(), BackendError> {
        let url = format!("{}/api/v1/users/address", self.base_url);
        debug!("Registering granter address {}", address);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "address": address }))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn create_strategy(
        &self,
        payload: &StrategyCreatePayload,
    ) -> Result<CreatedStrategy, BackendError> {
        let url = format!("{}/api/v1/plans", self.base_url);
        info!(
            "Creating {} plan for {} {}",
            payload.strategy_kind.as_str(),
            payload.amount,
            payload.token_symbol
        );

        let response = self.client.post(&url).json(payload).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<CreatedStrategy>().await?)
    }
}
