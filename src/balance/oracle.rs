use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::ActivationError;

/// Fixed decimal count of the native gas asset.
pub const NATIVE_GAS_DECIMALS: u32 = 18;

/// Fixed decimal count of the stable asset.
pub const STABLE_DECIMALS: u32 = 6;

/// One balance record as returned by the indexer: smallest-unit integer
/// amount keyed by denomination.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceSnapshot {
    pub denom: String,
    #[serde(default)]
    pub symbol: Option<String>,
    /// Smallest-unit amount, integer string
    pub amount: String,
}

/// Human-readable balances for the two assets the product tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletBalances {
    pub native_gas: Decimal,
    pub stable: Decimal,
}

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("indexer request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected indexer response: {0}")]
    Parse(String),
}

/// Source of raw balance records for an address.
#[async_trait]
pub trait BalanceIndexer: Send + Sync {
    async fn fetch_account_balances(
        &self,
        address: &str,
    ) -> Result<Vec<BalanceSnapshot>, IndexerError>;
}

/// Production indexer client over the portfolio-balance service.
pub struct HttpBalanceIndexer {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PortfolioBalancesResponse {
    balances: Vec<BalanceSnapshot>,
}

impl HttpBalanceIndexer {
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
}

#[async_trait]
impl BalanceIndexer for HttpBalanceIndexer {
    async fn fetch_account_balances(
        &self,
        address: &str,
    ) -> Result<Vec<BalanceSnapshot>, IndexerError> {
        let url = format!(
            "{}/api/explorer/v1/portfolio/{}/balances",
            self.base_url, address
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(IndexerError::Parse(format!(
                "indexer returned HTTP {}",
                response.status()
            )));
        }

        let body: PortfolioBalancesResponse = response.json().await?;
        Ok(body.balances)
    }
}

/// Converts a smallest-unit integer string to a human value by shifting the
/// decimal point left by `decimals`.
///
/// The indexer contract is integer strings. `set_scale` overwrites the
/// scale rather than shifting it, so a fractional amount would come out at
/// the wrong magnitude; anything with a fractional part is rejected before
/// the shift.
pub fn to_human_amount(raw: &str, decimals: u32) -> Result<Decimal, IndexerError> {
    let mut value = Decimal::from_str(raw)
        .map_err(|e| IndexerError::Parse(format!("bad amount {raw:?}: {e}")))?
        .normalize();
    if value.scale() != 0 {
        return Err(IndexerError::Parse(format!(
            "non-integer amount {raw:?}"
        )));
    }
    value
        .set_scale(decimals)
        .map_err(|e| IndexerError::Parse(format!("bad scale {decimals}: {e}")))?;
    Ok(value.normalize())
}

/// Balance oracle: display fetches fail safe to zero, the activation gate
/// distinguishes missing records from insufficient ones.
pub struct BalanceOracle {
    indexer: Arc<dyn BalanceIndexer>,
    stable_denom: String,
    native_gas_symbol: String,
}

impl BalanceOracle {
    pub fn new(
        indexer: Arc<dyn BalanceIndexer>,
        stable_denom: impl Into<String>,
        native_gas_symbol: impl Into<String>,
    ) -> Self {
        Self {
            indexer,
            stable_denom: stable_denom.into(),
            native_gas_symbol: native_gas_symbol.into(),
        }
    }

    pub fn stable_denom(&self) -> &str {
        &self.stable_denom
    }

    /// Fetch both tracked balances for display purposes.
    ///
    /// Never errors: any indexer or parsing failure is logged and reported
    /// as zero balances so the UI degrades gracefully instead of crashing.
    pub async fn fetch_balances(&self, address: &str) -> WalletBalances {
        match self.try_fetch_balances(address).await {
            Ok(balances) => balances,
            Err(e) => {
                warn!("Balance fetch for {} failed, reporting zero: {}", address, e);
                WalletBalances::default()
            }
        }
    }

    async fn try_fetch_balances(&self, address: &str) -> Result<WalletBalances, IndexerError> {
        let records = self.indexer.fetch_account_balances(address).await?;

        let stable = match records.iter().find(|r| r.denom == self.stable_denom) {
            Some(record) => to_human_amount(&record.amount, STABLE_DECIMALS)?,
            None => Decimal::ZERO,
        };

        let native_gas = match records.iter().find(|r| {
            r.symbol
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(&self.native_gas_symbol))
        }) {
            Some(record) => to_human_amount(&record.amount, NATIVE_GAS_DECIMALS)?,
            None => Decimal::ZERO,
        };

        debug!(
            "Balances for {}: gas={}, stable={}",
            address, native_gas, stable
        );

        Ok(WalletBalances { native_gas, stable })
    }

    /// Pre-broadcast funding gate.
    ///
    /// Fails with [`ActivationError::BalanceNotFound`] when the indexer
    /// returned no record for the stable denomination (never silently
    /// treated as zero), and with [`ActivationError::InsufficientFunds`]
    /// when the record exists but falls short of `required`. Comparison is
    /// decimal-exact.
    pub async fn check_minimum_balance(
        &self,
        address: &str,
        required: Decimal,
    ) -> Result<(), ActivationError> {
        let records = self
            .indexer
            .fetch_account_balances(address)
            .await
            .map_err(|e| ActivationError::Backend(format!("balance indexer: {e}")))?;

        let record = records
            .iter()
            .find(|r| r.denom == self.stable_denom)
            .ok_or_else(|| ActivationError::BalanceNotFound {
                denom: self.stable_denom.clone(),
            })?;

        let available = to_human_amount(&record.amount, STABLE_DECIMALS)
            .map_err(|e| ActivationError::Backend(format!("balance indexer: {e}")))?;

        if available < required {
            return Err(ActivationError::InsufficientFunds {
                required,
                available,
            });
        }

        debug!(
            "Balance check passed for {}: required={}, available={}",
            address, required, available
        );
        Ok(())
    }
}
