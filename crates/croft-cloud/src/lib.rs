//! Croft cloud abstraction
//!
//! Provider-facing side of Croft: a [`CloudProvider`] turns a stack
//! manifest into planned actions and applies them, while the state
//! module tracks what has been provisioned so teardown can walk the
//! records in reverse creation order.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 croft CLI                     │
//! │            (croft up / down / plan)           │
//! └──────────────────┬───────────────────────────┘
//!                    │ StackManifest (croft-core)
//! ┌──────────────────▼───────────────────────────┐
//! │               croft-cloud                     │
//! │   trait CloudProvider { plan / apply / … }    │
//! │   Plan · ApplyResult · .croft/state.json      │
//! └──────────────────┬───────────────────────────┘
//!                    │
//! ┌──────────────────▼───────────────────────────┐
//! │            croft-cloud-aws                    │
//! └──────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod error;
pub mod provider;
pub mod state;

// Re-exports
pub use action::{Action, ActionType, ActionResult, ApplyResult, Plan, PlanSummary};
pub use error::{CloudError, Result};
pub use provider::{AuthStatus, CloudProvider};
pub use state::{GlobalState, ResourceRecord, StackState, StateLock, StateManager};
