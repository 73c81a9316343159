//! # Client Cache Coordinator
//!
//! A request/response cache keyed by semantic query identifiers. After a
//! strategy mutation it invalidates and eagerly refetches exactly the
//! affected query groups, never the opposite environment's, and issues the
//! refetches concurrently since the groups are independent.

pub mod coordinator;

pub use coordinator::{
    Environment, MutationKind, QueryCacheCoordinator, QueryKey, QueryState, Refetcher,
};
