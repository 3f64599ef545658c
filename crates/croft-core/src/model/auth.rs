//! Identity pool, app client and authorizer descriptors

use serde::{Deserialize, Serialize};

use super::policy::TeardownPolicy;

/// Declares one user pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPoolSpec {
    pub name: String,
    pub self_sign_up_enabled: bool,
    /// Allow signing in with the email address as an alias.
    pub sign_in_email_alias: bool,
    pub teardown: TeardownPolicy,
}

/// Authentication flows an app client may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFlows {
    pub user_password: bool,
    pub user_srp: bool,
    pub admin_user_password: bool,
    pub custom: bool,
}

impl AuthFlows {
    /// The full set the item API's client supports.
    pub fn all() -> Self {
        Self {
            user_password: true,
            user_srp: true,
            admin_user_password: true,
            custom: true,
        }
    }
}

/// Identity providers an app client accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProvider {
    Cognito,
}

impl IdentityProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentityProvider::Cognito => "COGNITO",
        }
    }
}

/// Declares one app client. A client always belongs to exactly one pool,
/// recorded here by the pool's logical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPoolClientSpec {
    pub name: String,
    pub user_pool: String,
    pub auth_flows: AuthFlows,
    pub identity_providers: Vec<IdentityProvider>,
}

/// Declares an authorizer gating routes against one or more user pools.
///
/// Every protected route must reference an authorizer whose pool can
/// validate the caller's credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizerSpec {
    pub name: String,
    /// Logical names of the pools whose tokens this authorizer accepts.
    pub user_pools: Vec<String>,
}
