//! Cloud provider trait definition

use crate::action::{ApplyResult, Plan};
use crate::error::Result;
use crate::state::GlobalState;
use async_trait::async_trait;
use croft_core::StackManifest;
use serde::{Deserialize, Serialize};

/// Cloud provider abstraction trait
///
/// A provider consumes stack manifests and the recorded state of earlier
/// deployments. Resources already present in the state plan as no-ops;
/// apply must stop at the first failed action so a failed stack never
/// reports success, and must record every resource it provisions in the
/// state so teardown can find it again. The whole state is passed in
/// because a stack may hold handles to resources another stack
/// provisioned (the api stack's grants point at the database stack's
/// table).
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "aws")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Compute the actions needed to bring the stack to its declared state
    async fn plan(&self, manifest: &StackManifest, state: &GlobalState) -> Result<Plan>;

    /// Apply the planned actions, recording provisioned resources in `state`
    async fn apply(
        &self,
        manifest: &StackManifest,
        plan: &Plan,
        state: &mut GlobalState,
    ) -> Result<ApplyResult>;

    /// Destroy everything recorded for the stack, in reverse creation order
    async fn destroy_stack(&self, stack_name: &str, state: &mut GlobalState)
    -> Result<ApplyResult>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}
