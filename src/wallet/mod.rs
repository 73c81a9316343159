//! # Wallet Connector
//!
//! Abstracts over the three supported wallet providers (Keplr, Leap,
//! MetaMask) behind one capability trait, producing a uniform
//! [`WalletHandle`] whose `native_address` is always the canonical bech32
//! form regardless of provider. EVM raw addresses are translated exactly
//! once, immediately after retrieval.

pub mod address;
pub mod connector;
pub mod provider;

pub use address::{is_valid_evm_address, is_valid_native_address, translate_evm_address};
pub use connector::{InMemorySessionStore, SessionStore, WalletConnector, WalletHandle};
pub use provider::{BridgeWalletProvider, ProviderKind, TxResponse, WalletProvider};
