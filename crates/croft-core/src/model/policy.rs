//! Shared lifecycle policies

use serde::{Deserialize, Serialize};

/// Whether a resource's underlying data survives deletion of the stack
/// that declared it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownPolicy {
    /// Remove the resource and its data together with the stack.
    Destroy,
    /// Keep the underlying data when the stack is deleted.
    Retain,
}

impl TeardownPolicy {
    pub fn is_destroy(self) -> bool {
        matches!(self, TeardownPolicy::Destroy)
    }
}

impl std::fmt::Display for TeardownPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeardownPolicy::Destroy => write!(f, "destroy"),
            TeardownPolicy::Retain => write!(f, "retain"),
        }
    }
}
