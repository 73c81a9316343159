use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Message type URL of an authz grant on the target chain.
pub const AUTHZ_GRANT_TYPE_URL: &str = "/cosmos.authz.v1beta1.MsgGrant";

/// The two authorizations an activation grants the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationKind {
    /// Scoped: the operator may place and update orders on the exchange
    /// module on the granter's behalf.
    TradeExecution,
    /// Unscoped: the operator may move funds from the granter's account.
    FundTransfer,
}

impl AuthorizationKind {
    /// Message type the generic authorization is scoped to.
    pub fn msg_type_url(&self) -> &'static str {
        match self {
            AuthorizationKind::TradeExecution => {
                "/injective.exchange.v1beta1.MsgBatchUpdateOrders"
            }
            AuthorizationKind::FundTransfer => "/cosmos.bank.v1beta1.MsgSend",
        }
    }
}

/// One authorization grant: granter authorizes the fixed operator grantee
/// to execute a message type until `expiration_unix`.
///
/// Never persisted locally; the chain is the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantMsg {
    pub granter: String,
    pub grantee: String,
    pub authorization: AuthorizationKind,
    pub expiration_unix: i64,
}

impl GrantMsg {
    /// Wallet-signable JSON form of the grant message.
    pub fn to_signable_value(&self) -> Value {
        json!({
            "typeUrl": AUTHZ_GRANT_TYPE_URL,
            "value": {
                "granter": self.granter,
                "grantee": self.grantee,
                "grant": {
                    "authorization": {
                        "typeUrl": "/cosmos.authz.v1beta1.GenericAuthorization",
                        "msg": self.authorization.msg_type_url(),
                    },
                    "expiration": { "seconds": self.expiration_unix },
                },
            },
        })
    }
}
