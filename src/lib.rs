//! # One-Click Strategy Activation Gateway
//!
//! HTTP gateway for a one-click crypto strategy product. Implements the
//! wallet authorization and balance-gated activation flow:
//!
//! - `balance`: chain-indexer balance oracle with a fail-safe-to-zero
//!   display path and a decimal-exact pre-broadcast funding gate
//! - `wallet`: connector over the Keplr / Leap / MetaMask providers,
//!   producing canonical bech32 addresses (EVM addresses translated once)
//! - `grant`: builds and broadcasts the trade-execution and fund-transfer
//!   authorization pair toward the fixed operator grantee
//! - `backend`: strategy backend client (address registration, plan
//!   creation)
//! - `orchestrator`: the activation state machine tying it all together
//! - `cache`: environment-scoped query invalidation after mutations
//! - `routes` / `server`: the axum surface

pub mod backend;
pub mod balance;
pub mod cache;
pub mod config;
pub mod errors;
pub mod grant;
pub mod orchestrator;
pub mod routes;
pub mod server;
pub mod wallet;
