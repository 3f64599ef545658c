//! Cognito user pool and app client provisioning

use aws_sdk_cognitoidentityprovider::types::{
    AdminCreateUserConfigType, AliasAttributeType, ExplicitAuthFlowsType,
};
use croft_cloud::{CloudError, Result};
use croft_core::{UserPoolClientSpec, UserPoolSpec};

/// Provisioned pool coordinates other resources need.
#[derive(Debug, Clone)]
pub struct ProvisionedPool {
    pub id: String,
    pub arn: String,
}

pub struct UserPools {
    client: aws_sdk_cognitoidentityprovider::Client,
}

impl UserPools {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_cognitoidentityprovider::Client::new(config),
        }
    }

    pub async fn create_pool(&self, spec: &UserPoolSpec) -> Result<ProvisionedPool> {
        let mut request = self.client.create_user_pool().pool_name(&spec.name);

        if spec.sign_in_email_alias {
            request = request.alias_attributes(AliasAttributeType::Email);
        }
        request = request.admin_create_user_config(
            AdminCreateUserConfigType::builder()
                .allow_admin_create_user_only(!spec.self_sign_up_enabled)
                .build(),
        );

        let output = request.send().await.map_err(|e| {
            CloudError::ApiError(format!("failed to create user pool {}: {e}", spec.name))
        })?;

        let pool = output
            .user_pool()
            .ok_or_else(|| CloudError::ApiError(format!("user pool {} not returned", spec.name)))?;
        let id = pool
            .id()
            .ok_or_else(|| CloudError::ApiError(format!("user pool {} has no id", spec.name)))?
            .to_string();
        let arn = pool.arn().unwrap_or_default().to_string();

        tracing::info!(pool = %spec.name, id = %id, "user pool created");
        Ok(ProvisionedPool { id, arn })
    }

    fn auth_flows(spec: &UserPoolClientSpec) -> Vec<ExplicitAuthFlowsType> {
        let mut flows = Vec::new();
        if spec.auth_flows.user_password {
            flows.push(ExplicitAuthFlowsType::AllowUserPasswordAuth);
        }
        if spec.auth_flows.user_srp {
            flows.push(ExplicitAuthFlowsType::AllowUserSrpAuth);
        }
        if spec.auth_flows.admin_user_password {
            flows.push(ExplicitAuthFlowsType::AllowAdminUserPasswordAuth);
        }
        if spec.auth_flows.custom {
            flows.push(ExplicitAuthFlowsType::AllowCustomAuth);
        }
        // Token refresh is always allowed alongside the explicit flows.
        flows.push(ExplicitAuthFlowsType::AllowRefreshTokenAuth);
        flows
    }

    /// Creates the app client inside its pool. Returns the client id.
    pub async fn create_client(
        &self,
        pool_id: &str,
        spec: &UserPoolClientSpec,
    ) -> Result<String> {
        let mut request = self
            .client
            .create_user_pool_client()
            .user_pool_id(pool_id)
            .client_name(&spec.name);

        for flow in Self::auth_flows(spec) {
            request = request.explicit_auth_flows(flow);
        }
        for provider in &spec.identity_providers {
            request = request.supported_identity_providers(provider.as_str());
        }

        let output = request.send().await.map_err(|e| {
            CloudError::ApiError(format!("failed to create app client {}: {e}", spec.name))
        })?;

        let client_id = output
            .user_pool_client()
            .and_then(|c| c.client_id())
            .ok_or_else(|| {
                CloudError::ApiError(format!("app client {} has no id", spec.name))
            })?
            .to_string();

        tracing::info!(client = %spec.name, "app client created");
        Ok(client_id)
    }

    pub async fn delete_client(&self, pool_id: &str, client_id: &str) -> Result<()> {
        self.client
            .delete_user_pool_client()
            .user_pool_id(pool_id)
            .client_id(client_id)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to delete app client {client_id}: {e}"))
            })?;
        Ok(())
    }

    pub async fn delete_pool(&self, pool_id: &str) -> Result<()> {
        self.client
            .delete_user_pool()
            .user_pool_id(pool_id)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to delete user pool {pool_id}: {e}"))
            })?;
        tracing::info!(pool = %pool_id, "user pool deleted");
        Ok(())
    }
}
