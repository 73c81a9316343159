use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::Environment;

/// Supported strategy products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    #[serde(rename = "SDCA")]
    Sdca,
    #[serde(rename = "GRID")]
    Grid,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Sdca => "SDCA",
            StrategyKind::Grid => "GRID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// User-entered activation parameters. Built transiently by the activation
/// dialog, consumed once, discarded after success or failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyActivationRequest {
    /// USD-denominated amount, must be > 0
    pub amount: Decimal,
    pub frequency: Frequency,
    pub risk_level: RiskLevel,
    pub token_symbol: String,
    pub strategy_kind: StrategyKind,
    /// Chain as the UI names it; may be a display-only alias
    pub chain: String,
    /// Explicit payout recipient; required for SDCA unless
    /// `use_own_address` is set
    #[serde(default)]
    pub recipient_address: Option<String>,
    /// Substitute the wallet's own address as the recipient
    #[serde(default)]
    pub use_own_address: bool,
    #[serde(default)]
    pub slippage: Decimal,
    /// Live or paper execution; scopes cache invalidation
    #[serde(default)]
    pub environment: Environment,
}

/// Phases of one activation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPhase {
    Idle,
    Validating,
    ResolvingWallet,
    Granting,
    Submitting,
    Active,
    Failed,
}

/// Result of a fully successful activation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivatedStrategy {
    pub activation_id: Uuid,
    pub plan_id: String,
    pub wallet_address: String,
    pub phase: ActivationPhase,
}

/// Map a UI-only chain alias back to the backend's canonical chain
/// identifier. Unknown values pass through unchanged.
pub fn canonical_chain_id(chain: &str) -> &str {
    match chain {
        "injective-evm" | "inj-evm" => "injective",
        other => other,
    }
}
