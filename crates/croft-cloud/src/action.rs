//! Action types for stack provisioning

use croft_core::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One planned step against a declared resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action
    pub id: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Kind of the resource the action touches
    pub kind: ResourceKind,

    /// Logical name of the resource
    pub resource_name: String,

    /// Description of the action
    pub description: String,

    /// Additional details about the action
    pub details: HashMap<String, serde_json::Value>,
}

impl Action {
    pub fn create(kind: ResourceKind, resource_name: impl Into<String>) -> Self {
        let resource_name = resource_name.into();
        Self {
            id: format!("create-{resource_name}"),
            action_type: ActionType::Create,
            kind,
            resource_name: resource_name.clone(),
            description: format!("create {kind} {resource_name}"),
            details: HashMap::new(),
        }
    }

    pub fn delete(kind: ResourceKind, resource_name: impl Into<String>) -> Self {
        let resource_name = resource_name.into();
        Self {
            id: format!("delete-{resource_name}"),
            action_type: ActionType::Delete,
            kind,
            resource_name: resource_name.clone(),
            description: format!("delete {kind} {resource_name}"),
            details: HashMap::new(),
        }
    }

    pub fn noop(kind: ResourceKind, resource_name: impl Into<String>) -> Self {
        let resource_name = resource_name.into();
        Self {
            id: format!("noop-{resource_name}"),
            action_type: ActionType::NoOp,
            kind,
            resource_name: resource_name.clone(),
            description: format!("{kind} {resource_name} already provisioned"),
            details: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Result of applying actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Successfully applied actions
    pub succeeded: Vec<ActionResult>,

    /// Failed actions
    pub failed: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, action_id: impl Into<String>, message: impl Into<String>) {
        self.succeeded.push(ActionResult {
            action_id: action_id.into(),
            success: true,
            message: message.into(),
            error: None,
        });
    }

    pub fn add_failure(&mut self, action_id: impl Into<String>, error: impl Into<String>) {
        self.failed.push(ActionResult {
            action_id: action_id.into(),
            success: false,
            message: String::new(),
            error: Some(error.into()),
        });
    }
}

impl Default for ApplyResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// ID of the action
    pub action_id: String,

    /// Whether the action succeeded
    pub success: bool,

    /// Success message
    pub message: String,

    /// Error message if failed
    pub error: Option<String>,
}

/// Plan containing all actions for one stack, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Stack the plan was computed for
    pub stack: String,

    /// List of actions to perform
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(stack: impl Into<String>, actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            stack: stack.into(),
            actions,
            has_changes,
        }
    }

    pub fn empty(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            actions: Vec::new(),
            has_changes: false,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub create: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to delete, {} unchanged",
            self.create, self.delete, self.no_change
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_with_only_noops_has_no_changes() {
        let plan = Plan::new(
            "test-DatabaseStack",
            vec![Action::noop(ResourceKind::Table, "test-ItemsTable")],
        );
        assert!(!plan.has_changes);
        assert_eq!(plan.summary().no_change, 1);
    }

    #[test]
    fn plan_with_a_create_has_changes() {
        let plan = Plan::new(
            "test-DatabaseStack",
            vec![
                Action::create(ResourceKind::Table, "test-ItemsTable"),
                Action::noop(ResourceKind::Function, "test-PopulateDatabaseFunction"),
            ],
        );
        assert!(plan.has_changes);
        let summary = plan.summary();
        assert_eq!(summary.create, 1);
        assert_eq!(summary.no_change, 1);
        assert_eq!(summary.to_string(), "1 to create, 0 to delete, 1 unchanged");
    }
}
