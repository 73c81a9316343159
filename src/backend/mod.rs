//! Backend REST client: address registration and strategy creation.
//!
//! The backend itself is an external collaborator consumed over JSON; this
//! module is the only place its endpoint shapes appear. Per activation the
//! two calls happen in register-then-create order, never reordered.

pub mod client;

pub use client::{
    BackendApi, BackendError, CreatedStrategy, HttpBackendClient, StrategyCreatePayload,
};
