//! Lambda function provisioning and the one-shot seed invocation

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, FunctionCode, Runtime, State};
use croft_cloud::{CloudError, Result};
use croft_core::{FunctionSpec, RuntimeKind};

/// A freshly created role may not be assumable for a few seconds.
const CREATE_RETRY_INTERVAL: Duration = Duration::from_secs(3);
const CREATE_RETRY_ATTEMPTS: u32 = 10;

const ACTIVE_POLL_INTERVAL: Duration = Duration::from_secs(2);
const ACTIVE_POLL_ATTEMPTS: u32 = 30;

pub struct Functions {
    client: aws_sdk_lambda::Client,
}

impl Functions {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_lambda::Client::new(config),
        }
    }

    fn runtime(kind: RuntimeKind) -> Runtime {
        match kind {
            RuntimeKind::ProvidedAl2023 => Runtime::Providedal2023,
            RuntimeKind::Python312 => Runtime::Python312,
        }
    }

    /// Creates the function from packaged zip bytes and waits until it
    /// is invocable. Returns the function ARN.
    pub async fn create(
        &self,
        spec: &FunctionSpec,
        role_arn: &str,
        zip_bytes: Vec<u8>,
    ) -> Result<String> {
        let environment = if spec.environment.is_empty() {
            None
        } else {
            let variables: HashMap<String, String> = spec
                .environment
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Some(Environment::builder().set_variables(Some(variables)).build())
        };

        let mut attempts = 0;
        let arn = loop {
            let result = self
                .client
                .create_function()
                .function_name(&spec.name)
                .runtime(Self::runtime(spec.runtime))
                .handler(&spec.handler)
                .role(role_arn)
                .code(
                    FunctionCode::builder()
                        .zip_file(Blob::new(zip_bytes.clone()))
                        .build(),
                )
                .set_environment(environment.clone())
                .send()
                .await;

            match result {
                Ok(output) => {
                    break output
                        .function_arn()
                        .unwrap_or_default()
                        .to_string();
                }
                // Role propagation race: retry while IAM catches up.
                Err(e)
                    if attempts < CREATE_RETRY_ATTEMPTS
                        && e.as_service_error()
                            .is_some_and(|s| s.is_invalid_parameter_value_exception()) =>
                {
                    attempts += 1;
                    tracing::debug!(
                        function = %spec.name,
                        attempt = attempts,
                        "role not yet assumable, retrying"
                    );
                    tokio::time::sleep(CREATE_RETRY_INTERVAL).await;
                }
                Err(e) => {
                    return Err(CloudError::ApiError(format!(
                        "failed to create function {}: {e}",
                        spec.name
                    )));
                }
            }
        };

        self.wait_until_active(&spec.name).await?;
        tracing::info!(function = %spec.name, "function active");
        Ok(arn)
    }

    async fn wait_until_active(&self, name: &str) -> Result<()> {
        for _ in 0..ACTIVE_POLL_ATTEMPTS {
            let output = self
                .client
                .get_function_configuration()
                .function_name(name)
                .send()
                .await
                .map_err(|e| {
                    CloudError::ApiError(format!("failed to read function {name}: {e}"))
                })?;

            if output.state() == Some(&State::Active) {
                return Ok(());
            }
            tokio::time::sleep(ACTIVE_POLL_INTERVAL).await;
        }
        Err(CloudError::Timeout(format!(
            "function {name} did not become active"
        )))
    }

    /// Synchronously invokes the function once with an empty payload.
    /// A function-side error fails the whole deployment.
    pub async fn invoke_once(&self, name: &str) -> Result<()> {
        let output = self
            .client
            .invoke()
            .function_name(name)
            .payload(Blob::new(b"{}".to_vec()))
            .send()
            .await
            .map_err(|e| CloudError::ApiError(format!("failed to invoke {name}: {e}")))?;

        if let Some(function_error) = output.function_error() {
            let detail = output
                .payload()
                .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned())
                .unwrap_or_default();
            return Err(CloudError::ApiError(format!(
                "{name} reported {function_error}: {detail}"
            )));
        }
        tracing::info!(function = %name, "one-shot invocation succeeded");
        Ok(())
    }

    /// Allows the gateway to invoke the function.
    pub async fn allow_gateway_invoke(&self, name: &str, source_arn: &str) -> Result<()> {
        self.client
            .add_permission()
            .function_name(name)
            .statement_id("apigateway-invoke")
            .action("lambda:InvokeFunction")
            .principal("apigateway.amazonaws.com")
            .source_arn(source_arn)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!(
                    "failed to grant gateway invoke on {name}: {e}"
                ))
            })?;
        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.client
            .delete_function()
            .function_name(name)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to delete function {name}: {e}"))
            })?;
        tracing::info!(function = %name, "function deleted");
        Ok(())
    }
}

/// Extracts the account id from a Lambda function ARN
/// (`arn:aws:lambda:region:account:function:name`).
pub fn account_id_of(function_arn: &str) -> Option<&str> {
    function_arn.split(':').nth(4).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_is_the_fifth_arn_segment() {
        assert_eq!(
            account_id_of("arn:aws:lambda:eu-west-1:123456789012:function:test-GetItemFunction"),
            Some("123456789012")
        );
        assert_eq!(account_id_of("not-an-arn"), None);
    }
}
