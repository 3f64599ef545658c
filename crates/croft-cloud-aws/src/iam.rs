//! Execution roles and least-privilege table policies
//!
//! Each handler gets its own role so its grant set can be exactly what
//! the manifest declares: the read policy never contains a write action
//! and vice versa. Grants are one-directional, handler → table.

use croft_cloud::{CloudError, Result};
use croft_core::{FunctionSpec, TableAccess};
use serde_json::json;

/// Managed policy every execution role gets for log delivery.
const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Name of the inline table-access policy attached to a role.
const TABLE_POLICY_NAME: &str = "table-access";

const LAMBDA_TRUST_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Effect": "Allow",
      "Principal": { "Service": "lambda.amazonaws.com" },
      "Action": "sts:AssumeRole"
    }
  ]
}"#;

/// DynamoDB actions covered by a read grant.
pub fn read_actions() -> Vec<&'static str> {
    vec![
        "dynamodb:GetItem",
        "dynamodb:Query",
        "dynamodb:Scan",
        "dynamodb:BatchGetItem",
        "dynamodb:ConditionCheckItem",
    ]
}

/// DynamoDB actions covered by a write grant.
pub fn write_actions() -> Vec<&'static str> {
    vec![
        "dynamodb:PutItem",
        "dynamodb:UpdateItem",
        "dynamodb:DeleteItem",
        "dynamodb:BatchWriteItem",
    ]
}

pub fn actions_for(access: TableAccess) -> Vec<&'static str> {
    match access {
        TableAccess::Read => read_actions(),
        TableAccess::Write => write_actions(),
    }
}

/// Renders the inline policy document for a function's grants.
pub fn table_policy_document(spec: &FunctionSpec, table_arns: &[(String, String)]) -> String {
    let statements: Vec<serde_json::Value> = spec
        .grants
        .iter()
        .filter_map(|grant| {
            let arn = table_arns
                .iter()
                .find(|(name, _)| name == grant.table.name())
                .map(|(_, arn)| arn.clone())?;
            Some(json!({
                "Effect": "Allow",
                "Action": actions_for(grant.access),
                "Resource": arn,
            }))
        })
        .collect();

    json!({
        "Version": "2012-10-17",
        "Statement": statements,
    })
    .to_string()
}

pub struct Roles {
    client: aws_sdk_iam::Client,
}

impl Roles {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_iam::Client::new(config),
        }
    }

    /// Creates the execution role for one function and attaches its
    /// grant policy. Returns the role ARN.
    pub async fn create_execution_role(
        &self,
        role_name: &str,
        spec: &FunctionSpec,
        table_arns: &[(String, String)],
    ) -> Result<String> {
        let output = self
            .client
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(LAMBDA_TRUST_POLICY)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to create role {role_name}: {e}"))
            })?;

        let arn = output
            .role()
            .map(|r| r.arn().to_string())
            .ok_or_else(|| CloudError::ApiError(format!("role {role_name} has no ARN")))?;

        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(BASIC_EXECUTION_POLICY_ARN)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!(
                    "failed to attach logging policy to {role_name}: {e}"
                ))
            })?;

        if !spec.grants.is_empty() {
            let document = table_policy_document(spec, table_arns);
            self.client
                .put_role_policy()
                .role_name(role_name)
                .policy_name(TABLE_POLICY_NAME)
                .policy_document(document)
                .send()
                .await
                .map_err(|e| {
                    CloudError::ApiError(format!(
                        "failed to attach table policy to {role_name}: {e}"
                    ))
                })?;
        }

        tracing::info!(role = %role_name, "execution role created");
        Ok(arn)
    }

    pub async fn delete_execution_role(&self, role_name: &str) -> Result<()> {
        // Inline and managed policies must go before the role itself.
        let _ = self
            .client
            .delete_role_policy()
            .role_name(role_name)
            .policy_name(TABLE_POLICY_NAME)
            .send()
            .await;
        self.client
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(BASIC_EXECUTION_POLICY_ARN)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!(
                    "failed to detach logging policy from {role_name}: {e}"
                ))
            })?;
        self.client
            .delete_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to delete role {role_name}: {e}"))
            })?;
        tracing::info!(role = %role_name, "execution role deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use croft_core::{CodeArtifact, TableHandle};

    fn table_handle() -> (TableHandle, Vec<(String, String)>) {
        use croft_core::{
            CapacityMode, KeyAttribute, TableEncryption, TableSpec, TeardownPolicy,
        };
        let spec = TableSpec {
            name: "test-ItemsTable".to_string(),
            partition_key: KeyAttribute::string("id"),
            capacity: CapacityMode::OnDemand,
            encryption: TableEncryption::AwsOwned,
            teardown: TeardownPolicy::Destroy,
        };
        let arns = vec![(
            "test-ItemsTable".to_string(),
            "arn:aws:dynamodb:eu-west-1:123456789012:table/test-ItemsTable".to_string(),
        )];
        (spec.handle(), arns)
    }

    #[test]
    fn read_policy_contains_no_write_actions() {
        let (handle, arns) = table_handle();
        let spec = FunctionSpec::new("test-GetItemFunction", CodeArtifact::zip("a.zip"))
            .grant_read(&handle);

        let document = table_policy_document(&spec, &arns);
        for action in write_actions() {
            assert!(!document.contains(action), "unexpected {action}");
        }
        assert!(document.contains("dynamodb:GetItem"));
    }

    #[test]
    fn write_policy_contains_no_read_actions() {
        let (handle, arns) = table_handle();
        let spec = FunctionSpec::new("test-PostItemFunction", CodeArtifact::zip("a.zip"))
            .grant_write(&handle);

        let document = table_policy_document(&spec, &arns);
        for action in read_actions() {
            assert!(!document.contains(action), "unexpected {action}");
        }
        assert!(document.contains("dynamodb:PutItem"));
    }

    #[test]
    fn policy_scopes_to_the_granted_table_arn() {
        let (handle, arns) = table_handle();
        let spec = FunctionSpec::new("test-PostItemFunction", CodeArtifact::zip("a.zip"))
            .grant_write(&handle);

        let document: serde_json::Value =
            serde_json::from_str(&table_policy_document(&spec, &arns)).unwrap();
        assert_eq!(
            document["Statement"][0]["Resource"],
            serde_json::json!(arns[0].1)
        );
    }
}
