use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{BackendApi, StrategyCreatePayload};
use crate::cache::{MutationKind, QueryCacheCoordinator};
use crate::errors::ActivationError;
use crate::grant::GrantService;
use crate::orchestrator::types::{
    ActivatedStrategy, ActivationPhase, StrategyActivationRequest, StrategyKind,
    canonical_chain_id,
};
use crate::wallet::{ProviderKind, WalletConnector, is_valid_native_address};

/// Drives one activation attempt end to end. Holds no per-attempt state
/// beyond the in-flight guard; the request is consumed once and discarded.
pub struct ActivationOrchestrator {
    connector: Arc<WalletConnector>,
    grants: Arc<GrantService>,
    backend: Arc<dyn BackendApi>,
    cache: Arc<QueryCacheCoordinator>,
    bech32_hrp: String,
    // At-most-one in-flight activation per orchestrator instance. A second
    // trigger while GRANTING/SUBMITTING are pending must not reach the
    // wallet: a double broadcast would create two redundant grants.
    in_flight: Mutex<()>,
}

impl ActivationOrchestrator {
    pub fn new(
        connector: Arc<WalletConnector>,
        grants: Arc<GrantService>,
        backend: Arc<dyn BackendApi>,
        cache: Arc<QueryCacheCoordinator>,
        bech32_hrp: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            grants,
            backend,
            cache,
            bech32_hrp: bech32_hrp.into(),
            in_flight: Mutex::new(()),
        }
    }

    /// Run the full activation flow for `request` with the chosen wallet.
    pub async fn activate(
        &self,
        request: StrategyActivationRequest,
        wallet_choice: ProviderKind,
    ) -> Result<ActivatedStrategy, ActivationError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| ActivationError::ActivationInProgress)?;

        let activation_id = Uuid::new_v4();
        info!(
            "Activation {} started: {} {} on {} via {}",
            activation_id,
            request.strategy_kind.as_str(),
            request.amount,
            request.chain,
            wallet_choice
        );

        match self.run(activation_id, request, wallet_choice).await {
            Ok(activated) => Ok(activated),
            Err((phase, e)) => {
                warn!(
                    "Activation {} failed in {:?}: {} ({})",
                    activation_id,
                    phase,
                    e,
                    e.kind()
                );
                Err(e)
            }
        }
    }

    /// Errors are tagged with the phase they arose in. The same variant can
    /// surface from different phases (a user can reject the connect
    /// handshake or the grant signature), so the phase is recorded where
    /// the failure happens rather than inferred from the variant.
    async fn run(
        &self,
        activation_id: Uuid,
        request: StrategyActivationRequest,
        wallet_choice: ProviderKind,
    ) -> Result<ActivatedStrategy, (ActivationPhase, ActivationError)> {
        let at = |phase: ActivationPhase| move |e: ActivationError| (phase, e);

        debug!("Activation {}: {:?}", activation_id, ActivationPhase::Validating);
        self.validate(&request)
            .map_err(at(ActivationPhase::Validating))?;

        debug!(
            "Activation {}: {:?}",
            activation_id,
            ActivationPhase::ResolvingWallet
        );
        let handle = self
            .connector
            .connect(wallet_choice)
            .await
            .map_err(at(ActivationPhase::ResolvingWallet))?;
        let provider = self.connector.provider(wallet_choice).ok_or((
            ActivationPhase::ResolvingWallet,
            ActivationError::ProviderUnavailable(wallet_choice),
        ))?;

        debug!("Activation {}: {:?}", activation_id, ActivationPhase::Granting);
        let granter = self
            .grants
            .build_and_broadcast(provider.as_ref(), &handle, request.amount)
            .await
            .map_err(at(ActivationPhase::Granting))?;

        debug!("Activation {}: {:?}", activation_id, ActivationPhase::Submitting);
        let recipient = if request.use_own_address {
            handle.native_address.clone()
        } else {
            // validate() already guaranteed presence and shape for SDCA.
            request
                .recipient_address
                .clone()
                .unwrap_or_else(|| handle.native_address.clone())
        };

        let payload = StrategyCreatePayload {
            amount: request.amount,
            frequency: request.frequency,
            risk_level: request.risk_level,
            token_symbol: request.token_symbol.clone(),
            strategy_kind: request.strategy_kind,
            chain_id: canonical_chain_id(&request.chain).to_string(),
            user_wallet_address: handle.native_address.clone(),
            recipient_address: recipient,
            slippage: request.slippage,
        };

        let created = self
            .backend
            .create_strategy(&payload)
            .await
            .map_err(|e| {
                (
                    ActivationPhase::Submitting,
                    ActivationError::Backend(e.to_string()),
                )
            })?;

        info!(
            "Activation {} active: plan={}, granter={}",
            activation_id, created.plan_id, granter
        );

        self.cache
            .on_strategy_mutated(MutationKind::Created, request.environment)
            .await;

        Ok(ActivatedStrategy {
            activation_id,
            plan_id: created.plan_id,
            wallet_address: handle.native_address,
            phase: ActivationPhase::Active,
        })
    }

    /// Synchronous input validation; terminal failures here never touch
    /// the network.
    fn validate(&self, request: &StrategyActivationRequest) -> Result<(), ActivationError> {
        if request.amount <= Decimal::ZERO {
            return Err(ActivationError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        if request.token_symbol.trim().is_empty() {
            return Err(ActivationError::Validation(
                "a token must be selected".to_string(),
            ));
        }
        if request.chain.trim().is_empty() {
            return Err(ActivationError::Validation(
                "a chain must be selected".to_string(),
            ));
        }
        if request.slippage < Decimal::ZERO {
            return Err(ActivationError::Validation(
                "slippage must not be negative".to_string(),
            ));
        }

        if request.strategy_kind == StrategyKind::Sdca && !request.use_own_address {
            match request.recipient_address.as_deref() {
                Some(addr) if is_valid_native_address(addr, &self.bech32_hrp) => {}
                Some(addr) => {
                    return Err(ActivationError::Validation(format!(
                        "recipient address {addr} is not a valid {} address",
                        self.bech32_hrp
                    )));
                }
                None => {
                    return Err(ActivationError::Validation(
                        "SDCA requires a recipient address or the own-address option"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}
