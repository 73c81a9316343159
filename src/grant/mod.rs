//! # Grant Authorization Builder
//!
//! Constructs the two authorization grants (scoped trade execution and
//! unscoped fund transfer) toward the fixed operator grantee, gates on
//! stable-asset sufficiency before anything touches the chain, broadcasts
//! both grants as one simulated transaction batch, then registers the
//! granter address with the backend.

pub mod builder;
pub mod types;

pub use builder::{GrantService, build_grant_pair, required_balance};
pub use types::{AuthorizationKind, GrantMsg, AUTHZ_GRANT_TYPE_URL};
