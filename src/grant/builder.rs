use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::backend::BackendApi;
use crate::balance::BalanceOracle;
use crate::errors::ActivationError;
use crate::grant::types::{AuthorizationKind, GrantMsg};
use crate::wallet::{WalletHandle, WalletProvider};

/// Balance required to activate a strategy for `entered_amount`:
/// the amount plus the management fee surcharge, decimal-exact.
pub fn required_balance(entered_amount: Decimal, fee_rate: Decimal) -> Decimal {
    entered_amount * (Decimal::ONE + fee_rate)
}

/// Build the grant pair for one activation attempt: a scoped
/// trade-execution authorization and an unscoped fund-transfer
/// authorization, both toward `grantee`, both expiring `expiry_seconds`
/// after `now_unix`. Both grants share the same granter and expiry.
pub fn build_grant_pair(
    granter: &str,
    grantee: &str,
    now_unix: i64,
    expiry_seconds: i64,
) -> [GrantMsg; 2] {
    let expiration_unix = now_unix + expiry_seconds;
    [
        GrantMsg {
            granter: granter.to_string(),
            grantee: grantee.to_string(),
            authorization: AuthorizationKind::TradeExecution,
            expiration_unix,
        },
        GrantMsg {
            granter: granter.to_string(),
            grantee: grantee.to_string(),
            authorization: AuthorizationKind::FundTransfer,
            expiration_unix,
        },
    ]
}

/// Runs the gate → build → broadcast → register pipeline for one
/// activation attempt.
pub struct GrantService {
    oracle: Arc<BalanceOracle>,
    backend: Arc<dyn BackendApi>,
    operator_grantee: String,
    expiry_seconds: i64,
    management_fee_rate: Decimal,
}

impl GrantService {
    pub fn new(
        oracle: Arc<BalanceOracle>,
        backend: Arc<dyn BackendApi>,
        operator_grantee: impl Into<String>,
        expiry_seconds: i64,
        management_fee_rate: Decimal,
    ) -> Self {
        Self {
            oracle,
            backend,
            operator_grantee: operator_grantee.into(),
            expiry_seconds,
            management_fee_rate,
        }
    }

    /// Gate on funding, broadcast both grants as a single simulated batch,
    /// then register the granter address with the backend.
    ///
    /// The funding gate runs strictly before anything is built or
    /// broadcast, and its two failure kinds propagate untouched so callers
    /// can distinguish them. A registration failure after a successful
    /// broadcast surfaces as [`ActivationError::AddressRegistration`]: the
    /// operator already holds authorization on-chain at that point.
    pub async fn build_and_broadcast(
        &self,
        provider: &dyn WalletProvider,
        handle: &WalletHandle,
        entered_amount: Decimal,
    ) -> Result<String, ActivationError> {
        // The handle's native address is already canonical for every
        // provider, including the EVM wallet (translated at connect time).
        let granter = handle.native_address.clone();

        let required = required_balance(entered_amount, self.management_fee_rate);
        self.oracle.check_minimum_balance(&granter, required).await?;

        let msgs = build_grant_pair(
            &granter,
            &self.operator_grantee,
            Utc::now().timestamp(),
            self.expiry_seconds,
        );
        let signable = msgs.iter().map(GrantMsg::to_signable_value).collect();

        let tx = provider.sign_and_broadcast(&granter, signable, true).await?;
        info!(
            "Grant pair broadcast for {} via {}: tx={}",
            granter,
            provider.kind(),
            tx.tx_hash
        );

        if let Err(e) = self.backend.register_address(&granter).await {
            // Known inconsistency window: grant succeeded on-chain, the
            // backend doesn't know the granter yet. Surface, never swallow.
            warn!(
                "Address registration failed after broadcast for {}: {}",
                granter, e
            );
            return Err(ActivationError::AddressRegistration(e.to_string()));
        }

        Ok(granter)
    }
}
