//! # Balance Oracle
//!
//! Queries the chain indexer for an address's token balances, converts
//! smallest-unit amounts to human-readable decimals, and gates activations
//! on stable-asset sufficiency before any grant is broadcast.

pub mod oracle;
pub mod refresh;

pub use oracle::{
    BalanceIndexer, BalanceOracle, BalanceSnapshot, HttpBalanceIndexer, IndexerError,
    WalletBalances, NATIVE_GAS_DECIMALS, STABLE_DECIMALS,
};
pub use refresh::BalanceRefresher;
