//! Configuration module for environment variables and application settings

use std::env;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

/// Global application configuration loaded from environment variables
pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

#[derive(Debug, Clone)]
pub struct Config {
    /// Chain identity and address encoding
    pub chain: ChainConfig,

    /// Grant construction parameters
    pub grants: GrantConfig,

    /// Balance oracle configuration
    pub balances: BalanceConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// Base URL of the strategy backend (plan CRUD, address registration)
    pub backend_base_url: String,

    /// Base URL of the chain indexer / portfolio-balance service
    pub indexer_base_url: String,
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Network identifier the wallets are enabled against
    pub chain_id: String,
    /// Bech32 human-readable prefix for canonical addresses
    pub bech32_hrp: String,
}

#[derive(Debug, Clone)]
pub struct GrantConfig {
    /// Fixed operator address that receives both authorizations
    pub operator_grantee: String,
    /// Grant lifetime in seconds (default 30 days)
    pub expiry_seconds: i64,
    /// Surcharge applied to the entered amount when gating on balance
    pub management_fee_rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct BalanceConfig {
    /// Denomination identifier of the stable asset (network-dependent)
    pub stable_denom: String,
    /// Symbol of the native gas asset
    pub native_gas_symbol: String,
    /// Periodic balance refresh interval in seconds
    pub refresh_seconds: u64,
    /// Hard timeout for the wallet address-retrieval step in seconds
    pub address_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            chain: ChainConfig {
                chain_id: env::var("CHAIN_ID")
                    .unwrap_or_else(|_| "injective-888".to_string()),
                bech32_hrp: env::var("BECH32_HRP")
                    .unwrap_or_else(|_| "inj".to_string()),
            },

            grants: GrantConfig {
                operator_grantee: env::var("OPERATOR_GRANTEE_ADDRESS")
                    .unwrap_or_else(|_| {
                        "inj1p3ucd3ptpw902fluyjzhq3ffgq4ntddau9sxrm".to_string()
                    }),
                expiry_seconds: env::var("GRANT_EXPIRY_SECONDS")
                    .unwrap_or_else(|_| "2592000".to_string())
                    .parse()
                    .unwrap_or(2_592_000),
                management_fee_rate: env::var("MANAGEMENT_FEE_RATE")
                    .ok()
                    .and_then(|v| Decimal::from_str(&v).ok())
                    .unwrap_or_else(|| Decimal::new(3, 3)), // 0.003
            },

            balances: BalanceConfig {
                stable_denom: env::var("STABLE_DENOM").unwrap_or_else(|_| {
                    "peggy0x87aB3B4C8661e07D6372361211B96ed4Dc36B1B5".to_string()
                }),
                native_gas_symbol: env::var("NATIVE_GAS_SYMBOL")
                    .unwrap_or_else(|_| "INJ".to_string()),
                refresh_seconds: env::var("BALANCE_REFRESH_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
                address_timeout_seconds: env::var("ADDRESS_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },

            server: ServerConfig {
                host: env::var("SERVER_HOST")
                    .unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
                allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3001".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },

            backend_base_url: env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| "https://api.oneclick.exchange".to_string()),

            indexer_base_url: env::var("INDEXER_BASE_URL")
                .unwrap_or_else(|_| {
                    "https://k8s.testnet.exchange.grpc-web.injective.network".to_string()
                }),
        })
    }

    /// Validate values that would only fail deep inside the flow otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.grants.operator_grantee.is_empty() {
            return Err(anyhow!("OPERATOR_GRANTEE_ADDRESS must not be empty"));
        }
        if self.grants.expiry_seconds <= 0 {
            return Err(anyhow!("GRANT_EXPIRY_SECONDS must be positive"));
        }
        if self.grants.management_fee_rate < Decimal::ZERO {
            return Err(anyhow!("MANAGEMENT_FEE_RATE must not be negative"));
        }
        Ok(())
    }
}
