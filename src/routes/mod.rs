//! HTTP route handlers, organized by API domain.

/// Health check and monitoring endpoints
pub mod health;

/// Strategy activation endpoints
pub mod strategy;

/// Wallet connection and balance endpoints
pub mod wallet;
