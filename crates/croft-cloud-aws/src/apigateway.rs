//! REST gateway provisioning
//!
//! Builds the whole gateway surface in one pass: the API, the Cognito
//! authorizer, the resource tree, one method + proxy integration per
//! binding, invoke permissions on the bound functions, and finally the
//! stage deployment. The authorizer rejects requests on protected
//! methods before any handler runs; methods bound with no authorization
//! stay open.

use std::collections::HashMap;

use aws_sdk_apigateway::types::{AuthorizerType, IntegrationType};
use croft_cloud::{CloudError, Result};
use croft_core::{Authorization, RestApiSpec, RouteNode};

use crate::lambda::{Functions, account_id_of};

/// Provisioned gateway coordinates recorded in state.
#[derive(Debug, Clone)]
pub struct ProvisionedApi {
    pub id: String,
    pub invoke_url: String,
}

pub struct Gateways {
    client: aws_sdk_apigateway::Client,
    region: String,
}

impl Gateways {
    pub fn new(config: &aws_config::SdkConfig, region: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_apigateway::Client::new(config),
            region: region.into(),
        }
    }

    /// Creates the API with its authorizer and route tree.
    ///
    /// `pool_arns` are the ARNs backing the authorizer; `function_arns`
    /// maps logical function names to their provisioned ARNs.
    pub async fn create(
        &self,
        spec: &RestApiSpec,
        authorizer_name: &str,
        pool_arns: &[String],
        routes: &RouteNode,
        function_arns: &HashMap<String, String>,
        lambda: &Functions,
    ) -> Result<ProvisionedApi> {
        let api_id = self
            .client
            .create_rest_api()
            .name(&spec.name)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to create rest api {}: {e}", spec.name))
            })?
            .id()
            .ok_or_else(|| CloudError::ApiError(format!("rest api {} has no id", spec.name)))?
            .to_string();

        let root_id = self.root_resource_id(&api_id).await?;
        let authorizer_id = self
            .create_authorizer(&api_id, authorizer_name, pool_arns)
            .await?;

        self.create_route(
            &api_id,
            &root_id,
            routes,
            &authorizer_id,
            function_arns,
            lambda,
        )
        .await?;

        self.client
            .create_deployment()
            .rest_api_id(&api_id)
            .stage_name(&spec.stage)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to deploy rest api {}: {e}", spec.name))
            })?;

        let invoke_url = format!(
            "https://{api_id}.execute-api.{}.amazonaws.com/{}",
            self.region, spec.stage
        );
        tracing::info!(api = %spec.name, url = %invoke_url, "rest api deployed");
        Ok(ProvisionedApi { id: api_id, invoke_url })
    }

    async fn root_resource_id(&self, api_id: &str) -> Result<String> {
        let output = self
            .client
            .get_resources()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to list resources of {api_id}: {e}"))
            })?;

        output
            .items()
            .iter()
            .find(|r| r.path() == Some("/"))
            .and_then(|r| r.id())
            .map(str::to_string)
            .ok_or_else(|| {
                CloudError::ApiError(format!("rest api {api_id} has no root resource"))
            })
    }

    async fn create_authorizer(
        &self,
        api_id: &str,
        name: &str,
        pool_arns: &[String],
    ) -> Result<String> {
        let mut request = self
            .client
            .create_authorizer()
            .rest_api_id(api_id)
            .name(name)
            .r#type(AuthorizerType::CognitoUserPools)
            .identity_source("method.request.header.Authorization");
        for arn in pool_arns {
            request = request.provider_arns(arn);
        }

        request
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to create authorizer {name}: {e}"))
            })?
            .id()
            .map(str::to_string)
            .ok_or_else(|| CloudError::ApiError(format!("authorizer {name} has no id")))
    }

    /// Depth-first creation of the resource tree with its methods.
    async fn create_route(
        &self,
        api_id: &str,
        parent_id: &str,
        node: &RouteNode,
        authorizer_id: &str,
        function_arns: &HashMap<String, String>,
        lambda: &Functions,
    ) -> Result<()> {
        let resource_id = self
            .client
            .create_resource()
            .rest_api_id(api_id)
            .parent_id(parent_id)
            .path_part(node.segment.path_part())
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!(
                    "failed to create resource {}: {e}",
                    node.segment.path_part()
                ))
            })?
            .id()
            .ok_or_else(|| {
                CloudError::ApiError(format!(
                    "resource {} has no id",
                    node.segment.path_part()
                ))
            })?
            .to_string();

        for binding in &node.bindings {
            let function_arn = function_arns.get(&binding.function).ok_or_else(|| {
                CloudError::InvalidConfig(format!(
                    "route references unknown function {}",
                    binding.function
                ))
            })?;

            let mut method = self
                .client
                .put_method()
                .rest_api_id(api_id)
                .resource_id(&resource_id)
                .http_method(binding.method.as_str());
            method = match &binding.authorization {
                Authorization::None => method.authorization_type("NONE"),
                Authorization::CognitoUserPools { .. } => method
                    .authorization_type("COGNITO_USER_POOLS")
                    .authorizer_id(authorizer_id),
            };
            method.send().await.map_err(|e| {
                CloudError::ApiError(format!(
                    "failed to put method {} on {}: {e}",
                    binding.method.as_str(),
                    node.segment.path_part()
                ))
            })?;

            // Proxy integration; Lambda is always invoked with POST.
            let invocation_uri = format!(
                "arn:aws:apigateway:{}:lambda:path/2015-03-31/functions/{function_arn}/invocations",
                self.region
            );
            self.client
                .put_integration()
                .rest_api_id(api_id)
                .resource_id(&resource_id)
                .http_method(binding.method.as_str())
                .r#type(IntegrationType::AwsProxy)
                .integration_http_method("POST")
                .uri(invocation_uri)
                .send()
                .await
                .map_err(|e| {
                    CloudError::ApiError(format!(
                        "failed to put integration for {}: {e}",
                        binding.function
                    ))
                })?;

            if let Some(account) = account_id_of(function_arn) {
                let source_arn = format!(
                    "arn:aws:execute-api:{}:{account}:{api_id}/*/*/*",
                    self.region
                );
                lambda
                    .allow_gateway_invoke(&binding.function, &source_arn)
                    .await?;
            }
        }

        for child in &node.children {
            Box::pin(self.create_route(
                api_id,
                &resource_id,
                child,
                authorizer_id,
                function_arns,
                lambda,
            ))
            .await?;
        }
        Ok(())
    }

    pub async fn delete(&self, api_id: &str) -> Result<()> {
        self.client
            .delete_rest_api()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to delete rest api {api_id}: {e}"))
            })?;
        tracing::info!(api = %api_id, "rest api deleted");
        Ok(())
    }
}
