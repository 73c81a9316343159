use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::errors::ActivationError;
use crate::wallet::address::{is_valid_native_address, translate_evm_address};
use crate::wallet::provider::{ProviderKind, WalletProvider};

/// Uniform wallet handle produced by a successful handshake.
///
/// `native_address` is always the canonical bech32 form used for all
/// downstream balance and grant operations. `evm_address` is present if and
/// only if the provider is the EVM wallet; it is kept for display only and
/// never flows into a grant or balance call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletHandle {
    pub provider: ProviderKind,
    pub native_address: String,
    pub evm_address: Option<String>,
}

/// Persists only the provider kind across restarts. Rehydration runs a
/// fresh connect; cached addresses are never trusted.
pub trait SessionStore: Send + Sync {
    fn persist_provider(&self, kind: ProviderKind);
    fn load_provider(&self) -> Option<ProviderKind>;
    fn clear(&self);
}

#[derive(Default)]
pub struct InMemorySessionStore {
    slot: Mutex<Option<ProviderKind>>,
}

impl SessionStore for InMemorySessionStore {
    fn persist_provider(&self, kind: ProviderKind) {
        *self.slot.lock() = Some(kind);
    }

    fn load_provider(&self) -> Option<ProviderKind> {
        *self.slot.lock()
    }

    fn clear(&self) {
        *self.slot.lock() = None;
    }
}

/// Connects to one of the registered wallet providers and owns the
/// resulting session. On any handshake failure the session fully resets to
/// disconnected before the error surfaces, so a retry starts clean.
pub struct WalletConnector {
    providers: Vec<Arc<dyn WalletProvider>>,
    chain_id: String,
    bech32_hrp: String,
    address_timeout: Duration,
    session: RwLock<Option<WalletHandle>>,
    store: Arc<dyn SessionStore>,
}

impl WalletConnector {
    pub fn new(
        providers: Vec<Arc<dyn WalletProvider>>,
        chain_id: impl Into<String>,
        bech32_hrp: impl Into<String>,
        address_timeout: Duration,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            providers,
            chain_id: chain_id.into(),
            bech32_hrp: bech32_hrp.into(),
            address_timeout,
            session: RwLock::new(None),
            store,
        }
    }

    /// Providers whose capability marker is present. Absence is an
    /// omission from this list, not an error.
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.kind())
            .collect()
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<Arc<dyn WalletProvider>> {
        self.providers
            .iter()
            .find(|p| p.kind() == kind)
            .cloned()
    }

    pub fn current_session(&self) -> Option<WalletHandle> {
        self.session.read().clone()
    }

    /// Connect the selected provider and produce a [`WalletHandle`].
    pub async fn connect(&self, kind: ProviderKind) -> Result<WalletHandle, ActivationError> {
        let provider = self
            .provider(kind)
            .filter(|p| p.is_available())
            .ok_or(ActivationError::ProviderUnavailable(kind))?;

        match self.handshake(provider.as_ref()).await {
            Ok(handle) => {
                info!(
                    "Wallet connected: provider={}, address={}",
                    kind, handle.native_address
                );
                *self.session.write() = Some(handle.clone());
                self.store.persist_provider(kind);
                Ok(handle)
            }
            Err(e) => {
                // Never leave a partially populated session behind.
                self.reset();
                warn!("Wallet connect failed for {}: {}", kind, e);
                Err(e)
            }
        }
    }

    async fn handshake(
        &self,
        provider: &dyn WalletProvider,
    ) -> Result<WalletHandle, ActivationError> {
        provider.enable(&self.chain_id).await?;

        let seconds = self.address_timeout.as_secs();
        let accounts = timeout(self.address_timeout, provider.accounts())
            .await
            .map_err(|_| ActivationError::ConnectionTimeout { seconds })??;

        let raw = accounts.into_iter().next().ok_or_else(|| {
            ActivationError::InvalidAddress("provider returned no accounts".to_string())
        })?;

        if provider.kind().is_evm() {
            // Translate once, immediately; only the canonical form flows on.
            let native = translate_evm_address(&raw, &self.bech32_hrp)?;
            Ok(WalletHandle {
                provider: provider.kind(),
                native_address: native,
                evm_address: Some(raw),
            })
        } else {
            if !is_valid_native_address(&raw, &self.bech32_hrp) {
                return Err(ActivationError::InvalidAddress(format!(
                    "provider returned non-canonical address {raw}"
                )));
            }
            Ok(WalletHandle {
                provider: provider.kind(),
                native_address: raw,
                evm_address: None,
            })
        }
    }

    /// On app start, attempt to reconnect the persisted provider kind.
    pub async fn rehydrate(&self) -> Option<WalletHandle> {
        let kind = self.store.load_provider()?;
        match self.connect(kind).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Session rehydration for {} failed: {}", kind, e);
                None
            }
        }
    }

    /// Disconnect and clear all persisted fields atomically.
    pub fn disconnect(&self) {
        self.reset();
        info!("Wallet disconnected");
    }

    fn reset(&self) {
        *self.session.write() = None;
        self.store.clear();
    }
}
