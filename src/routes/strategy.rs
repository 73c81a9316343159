//! # Strategy Routes
//!
//! The activation endpoint and the error-body mapping. The mapping
//! preserves each error's discriminant (`error` field) and, for the two
//! funding failures, the amounts the UI copy needs. A post-broadcast
//! registration failure is flagged `partial: true`: the grant already
//! succeeded on-chain and the response must not read as a full failure.

use axum::{
    Router,
    extract::{Json, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::errors::ActivationError;
use crate::orchestrator::{ActivatedStrategy, StrategyActivationRequest};
use crate::server::AppState;
use crate::wallet::ProviderKind;

/// Body of `POST /api/v1/strategy/activate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    pub wallet: ProviderKind,
    #[serde(flatten)]
    pub request: StrategyActivationRequest,
}

/// Structured error body; `error` is the stable discriminant.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
}

/// Map an [`ActivationError`] onto an HTTP status and structured body.
pub fn error_response(error: &ActivationError) -> (StatusCode, ResponseJson<ErrorResponse>) {
    let status = match error {
        ActivationError::Validation(_) | ActivationError::InvalidAddress(_) => {
            StatusCode::BAD_REQUEST
        }
        ActivationError::ActivationInProgress => StatusCode::CONFLICT,
        ActivationError::InsufficientFunds { .. } | ActivationError::BalanceNotFound { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ActivationError::ProviderUnavailable(_) => StatusCode::NOT_FOUND,
        ActivationError::UserRejected => StatusCode::BAD_REQUEST,
        ActivationError::ConnectionTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ActivationError::GrantBroadcast(_)
        | ActivationError::AddressRegistration(_)
        | ActivationError::Backend(_) => StatusCode::BAD_GATEWAY,
    };

    let details = match error {
        ActivationError::InsufficientFunds {
            required,
            available,
        } => Some(json!({ "required": required, "available": available })),
        ActivationError::BalanceNotFound { denom } => Some(json!({ "denom": denom })),
        ActivationError::ConnectionTimeout { seconds } => Some(json!({ "seconds": seconds })),
        _ => None,
    };

    (
        status,
        ResponseJson(ErrorResponse {
            error: error.kind(),
            message: error.to_string(),
            details,
            partial: error.is_partial_success(),
        }),
    )
}

/// Activate a strategy: validate, resolve the wallet, broadcast the grant
/// pair, register the granter, create the plan.
pub async fn activate_strategy(
    State(state): State<AppState>,
    Json(body): Json<ActivateRequest>,
) -> Result<ResponseJson<ActivatedStrategy>, (StatusCode, ResponseJson<ErrorResponse>)> {
    info!(
        "Activation requested: {} via {}",
        body.request.strategy_kind.as_str(),
        body.wallet
    );

    let activated = state
        .orchestrator
        .activate(body.request, body.wallet)
        .await
        .map_err(|e| error_response(&e))?;

    Ok(ResponseJson(activated))
}

/// Create the strategy routes
pub fn create_routes() -> Router<AppState> {
    Router::new().route("/api/v1/strategy/activate", post(activate_strategy))
}
