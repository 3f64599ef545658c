//! DynamoDB table provisioning

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType, SseSpecification, SseType, TableStatus,
};
use croft_cloud::{CloudError, Result};
use croft_core::{AttributeKind, CapacityMode, TableEncryption, TableSpec};

/// How long to wait for a new table to become ACTIVE.
const ACTIVE_POLL_INTERVAL: Duration = Duration::from_secs(2);
const ACTIVE_POLL_ATTEMPTS: u32 = 60;

pub struct Tables {
    client: aws_sdk_dynamodb::Client,
}

impl Tables {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_dynamodb::Client::new(config),
        }
    }

    fn scalar_type(kind: AttributeKind) -> ScalarAttributeType {
        match kind {
            AttributeKind::String => ScalarAttributeType::S,
            AttributeKind::Number => ScalarAttributeType::N,
            AttributeKind::Binary => ScalarAttributeType::B,
        }
    }

    /// Creates the table and waits until it is ACTIVE. Returns the table ARN.
    pub async fn create(&self, spec: &TableSpec) -> Result<String> {
        let key = AttributeDefinition::builder()
            .attribute_name(&spec.partition_key.name)
            .attribute_type(Self::scalar_type(spec.partition_key.kind))
            .build()
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;
        let schema = KeySchemaElement::builder()
            .attribute_name(&spec.partition_key.name)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;

        let mut request = self
            .client
            .create_table()
            .table_name(&spec.name)
            .attribute_definitions(key)
            .key_schema(schema);

        request = match spec.capacity {
            CapacityMode::OnDemand => request.billing_mode(BillingMode::PayPerRequest),
            CapacityMode::Provisioned { read, write } => request
                .billing_mode(BillingMode::Provisioned)
                .provisioned_throughput(
                    ProvisionedThroughput::builder()
                        .read_capacity_units(i64::from(read))
                        .write_capacity_units(i64::from(write))
                        .build()
                        .map_err(|e| CloudError::InvalidConfig(e.to_string()))?,
                ),
        };

        // AwsOwned is the service default and needs no SSE specification.
        if spec.encryption == TableEncryption::AwsManaged {
            request = request.sse_specification(
                SseSpecification::builder()
                    .enabled(true)
                    .sse_type(SseType::Kms)
                    .build(),
            );
        }

        let output = request.send().await.map_err(|e| {
            CloudError::ApiError(format!("failed to create table {}: {e}", spec.name))
        })?;

        let arn = output
            .table_description()
            .and_then(|d| d.table_arn())
            .unwrap_or_default()
            .to_string();

        self.wait_until_active(&spec.name).await?;
        tracing::info!(table = %spec.name, "table active");
        Ok(arn)
    }

    async fn wait_until_active(&self, name: &str) -> Result<()> {
        for _ in 0..ACTIVE_POLL_ATTEMPTS {
            let output = self
                .client
                .describe_table()
                .table_name(name)
                .send()
                .await
                .map_err(|e| {
                    CloudError::ApiError(format!("failed to describe table {name}: {e}"))
                })?;

            if output.table().and_then(|t| t.table_status())
                == Some(&TableStatus::Active)
            {
                return Ok(());
            }
            tokio::time::sleep(ACTIVE_POLL_INTERVAL).await;
        }
        Err(CloudError::Timeout(format!(
            "table {name} did not become active"
        )))
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(name)
            .send()
            .await
            .map_err(|e| CloudError::ApiError(format!("failed to delete table {name}: {e}")))?;
        tracing::info!(table = %name, "table deleted");
        Ok(())
    }
}
