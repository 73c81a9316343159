use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::errors::ActivationError;

/// The three supported wallet providers. Keplr and Leap expose canonical
/// bech32 addresses directly; MetaMask exposes raw EVM addresses that need
/// translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Keplr,
    Leap,
    Metamask,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] =
        [ProviderKind::Keplr, ProviderKind::Leap, ProviderKind::Metamask];

    /// Whether addresses from this provider arrive in raw EVM form.
    pub fn is_evm(&self) -> bool {
        matches!(self, ProviderKind::Metamask)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Keplr => "keplr",
            ProviderKind::Leap => "leap",
            ProviderKind::Metamask => "metamask",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful transaction broadcast through a wallet.
#[derive(Debug, Clone, Deserialize)]
pub struct TxResponse {
    pub tx_hash: String,
    #[serde(default)]
    pub height: Option<u64>,
}

/// Capability set a wallet provider must supply: presence detection,
/// chain enablement, account retrieval, and signing/broadcast.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Presence detection. An unavailable provider is omitted from the
    /// selectable list; absence is not an error.
    fn is_available(&self) -> bool;

    /// Enable the provider's signing strategy for the given network.
    async fn enable(&self, chain_id: &str) -> Result<(), ActivationError>;

    /// Addresses exposed by the provider, in the provider's native format
    /// (raw EVM for MetaMask, bech32 for the others).
    async fn accounts(&self) -> Result<Vec<String>, ActivationError>;

    /// Sign and broadcast a message batch as a single transaction.
    /// `simulate` runs a gas/validity simulation before prompting for a
    /// signature so invalid batches fail fast.
    async fn sign_and_broadcast(
        &self,
        signer: &str,
        msgs: Vec<Value>,
        simulate: bool,
    ) -> Result<TxResponse, ActivationError>;
}

/// Wallet provider reached over an HTTP bridge.
///
/// Server-side stand-in for a browser extension: each provider kind maps to
/// a bridge endpoint that proxies enable/accounts/broadcast to the actual
/// wallet. A provider is available exactly when its bridge URL is
/// configured, mirroring the extension's window-global capability marker.
pub struct BridgeWalletProvider {
    kind: ProviderKind,
    client: Client,
    bridge_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BridgeAccountsResponse {
    accounts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BridgeErrorBody {
    #[serde(default)]
    rejected: bool,
    #[serde(default)]
    message: String,
}

impl BridgeWalletProvider {
    pub fn new(kind: ProviderKind, bridge_url: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            kind,
            client,
            bridge_url,
        }
    }

    /// Build from the conventional `WALLET_BRIDGE_<KIND>_URL` env var.
    pub fn from_env(kind: ProviderKind) -> Self {
        let var = format!("WALLET_BRIDGE_{}_URL", kind.as_str().to_uppercase());
        Self::new(kind, std::env::var(var).ok())
    }

    fn url(&self) -> Result<&str, ActivationError> {
        self.bridge_url
            .as_deref()
            .ok_or(ActivationError::ProviderUnavailable(self.kind))
    }

    /// A non-2xx bridge response either carries a user rejection or a
    /// provider-side diagnostic; keep the two distinct. `on_other` shapes
    /// the non-rejection case, since a failed broadcast and a failed
    /// handshake surface as different error kinds.
    async fn classify_failure(
        response: reqwest::Response,
        on_other: fn(String) -> ActivationError,
    ) -> ActivationError {
        let status = response.status();
        match response.json::<BridgeErrorBody>().await {
            Ok(body) if body.rejected => ActivationError::UserRejected,
            Ok(body) => on_other(format!("bridge returned {status}: {}", body.message)),
            Err(_) => on_other(format!("bridge returned {status}")),
        }
    }
}

#[async_trait]
impl WalletProvider for BridgeWalletProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        self.bridge_url.is_some()
    }

    async fn enable(&self, chain_id: &str) -> Result<(), ActivationError> {
        let url = format!("{}/enable", self.url()?);
        debug!("Enabling {} for chain {}", self.kind, chain_id);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "chainId": chain_id }))
            .send()
            .await
            .map_err(|e| ActivationError::Backend(format!("{} bridge: {e}", self.kind)))?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response, ActivationError::Backend).await);
        }
        Ok(())
    }

    async fn accounts(&self) -> Result<Vec<String>, ActivationError> {
        let url = format!("{}/accounts", self.url()?);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ActivationError::Backend(format!("{} bridge: {e}", self.kind)))?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response, ActivationError::Backend).await);
        }

        let body: BridgeAccountsResponse = response
            .json()
            .await
            .map_err(|e| ActivationError::Backend(format!("{} bridge: {e}", self.kind)))?;
        Ok(body.accounts)
    }

    async fn sign_and_broadcast(
        &self,
        signer: &str,
        msgs: Vec<Value>,
        simulate: bool,
    ) -> Result<TxResponse, ActivationError> {
        let url = format!("{}/broadcast", self.url()?);
        info!(
            "Broadcasting {} message(s) via {} (simulate={})",
            msgs.len(),
            self.kind,
            simulate
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "signer": signer,
                "msgs": msgs,
                "simulate": simulate,
            }))
            .send()
            .await
            .map_err(|e| ActivationError::GrantBroadcast(format!("{} bridge: {e}", self.kind)))?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response, ActivationError::GrantBroadcast).await);
        }

        response
            .json::<TxResponse>()
            .await
            .map_err(|e| ActivationError::GrantBroadcast(format!("bad bridge response: {e}")))
    }
}
