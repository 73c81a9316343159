//! # Activation Error Taxonomy
//!
//! Every failure in the activation flow is surfaced with its specific
//! discriminant preserved end-to-end. No layer collapses a variant into a
//! generic message: the UI copy depends on distinguishing at least the two
//! funding failures, and the post-broadcast registration failure is a
//! partial success, not a full failure.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::wallet::ProviderKind;

/// Failures surfaced by the strategy activation flow.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// Bad user input, detected synchronously before any network call.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A second activation was triggered while one is still pending.
    #[error("an activation is already in progress")]
    ActivationInProgress,

    /// Stable-asset balance exists but is below the required amount.
    /// Carries both sides so the UI can state the shortfall.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    /// The indexer returned no record at all for the stable denomination.
    /// Distinct from a zero balance: likely indexer unavailability.
    #[error("no balance record found for denom {denom}")]
    BalanceNotFound { denom: String },

    /// The selected wallet provider is not present in this environment.
    #[error("wallet provider {0} is not available")]
    ProviderUnavailable(ProviderKind),

    /// The user declined the connection or signature in the wallet UI.
    #[error("request rejected by the wallet")]
    UserRejected,

    /// The wallet did not return an address within the hard timeout.
    #[error("wallet did not return an address within {seconds}s")]
    ConnectionTimeout { seconds: u64 },

    /// Simulation or on-chain submission of the grant batch failed.
    #[error("grant broadcast failed: {0}")]
    GrantBroadcast(String),

    /// The grant succeeded on-chain but the backend address registration
    /// failed. The operator holds authorization the backend doesn't know
    /// about yet; callers must report this as a partial success.
    #[error("address registration failed after grant broadcast: {0}")]
    AddressRegistration(String),

    /// Backend or indexer request failed outside the cases above.
    #[error("backend request failed: {0}")]
    Backend(String),

    /// Address failed to parse or validate against the expected format.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ActivationError {
    /// Stable machine-readable name for the variant, used in HTTP error
    /// bodies so clients can branch without parsing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::ActivationInProgress => "activation_in_progress",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::BalanceNotFound { .. } => "balance_not_found",
            Self::ProviderUnavailable(_) => "provider_unavailable",
            Self::UserRejected => "user_rejected",
            Self::ConnectionTimeout { .. } => "connection_timeout",
            Self::GrantBroadcast(_) => "grant_broadcast",
            Self::AddressRegistration(_) => "address_registration",
            Self::Backend(_) => "backend",
            Self::InvalidAddress(_) => "invalid_address",
        }
    }

    /// True when the on-chain side effect already happened and only the
    /// bookkeeping failed.
    pub fn is_partial_success(&self) -> bool {
        matches!(self, Self::AddressRegistration(_))
    }
}
