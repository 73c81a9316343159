//! # Strategy Activation Orchestrator
//!
//! Drives one activation attempt through its phases:
//!
//! ```text
//! IDLE -> VALIDATING -> RESOLVING_WALLET -> GRANTING -> SUBMITTING -> ACTIVE
//!                                                  \-> FAILED(reason)
//! ```
//!
//! Every failure keeps its specific error kind; at most one activation is
//! in flight per orchestrator instance.

pub mod activation;
pub mod types;

pub use activation::ActivationOrchestrator;
pub use types::{
    ActivatedStrategy, ActivationPhase, Frequency, RiskLevel, StrategyActivationRequest,
    StrategyKind, canonical_chain_id,
};
