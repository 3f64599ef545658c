//! AWS provider implementation

use std::collections::HashMap;

use async_trait::async_trait;
use aws_credential_types::provider::ProvideCredentials;
use croft_cloud::{
    Action, ActionType, ApplyResult, AuthStatus, CloudError, CloudProvider, GlobalState, Plan,
    ResourceRecord, Result,
};
use croft_core::{Resource, ResourceKind, StackManifest};

use crate::apigateway::Gateways;
use crate::cloudfront::Cdn;
use crate::cognito::UserPools;
use crate::dynamodb::Tables;
use crate::iam::Roles;
use crate::lambda::Functions;
use crate::s3::{Buckets, bundle_digests};

// Attribute keys threaded through resource records.
const ATTR_ARN: &str = "arn";
const ATTR_ROLE_NAME: &str = "role_name";
const ATTR_ROLE_ARN: &str = "role_arn";
const ATTR_SEEDED: &str = "seeded";
const ATTR_POOL_ID: &str = "user_pool_id";
const ATTR_CANONICAL_USER: &str = "canonical_user_id";
const ATTR_DOMAIN: &str = "domain_name";
const ATTR_INVOKE_URL: &str = "invoke_url";
const ATTR_OBJECTS: &str = "objects";

/// AWS provider
pub struct AwsProvider {
    config: aws_config::SdkConfig,
    tables: Tables,
    roles: Roles,
    functions: Functions,
    pools: UserPools,
    gateways: Gateways,
    buckets: Buckets,
    cdn: Cdn,
}

impl AwsProvider {
    /// Resolves the shared SDK configuration and builds the service
    /// clients. A region must be resolvable; everything downstream
    /// needs it for ARNs and origin domains.
    pub async fn connect(region: Option<String>) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        let region = config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| {
                CloudError::InvalidConfig(
                    "no AWS region configured; pass --region or set AWS_REGION".to_string(),
                )
            })?;
        Ok(Self::from_config(config, region))
    }

    pub fn from_config(config: aws_config::SdkConfig, region: String) -> Self {
        Self {
            tables: Tables::new(&config),
            roles: Roles::new(&config),
            functions: Functions::new(&config),
            pools: UserPools::new(&config),
            gateways: Gateways::new(&config, region.clone()),
            buckets: Buckets::new(&config, region.clone()),
            cdn: Cdn::new(&config, region),
            config,
        }
    }

    fn record_of<'a>(
        state: &'a GlobalState,
        logical_name: &str,
    ) -> Result<&'a ResourceRecord> {
        state.find_record(logical_name).ok_or_else(|| {
            CloudError::ResourceNotFound(format!(
                "{logical_name} is not provisioned; deploy its stack first"
            ))
        })
    }

    /// ARNs of the tables a function's grants reference.
    fn table_arns(
        state: &GlobalState,
        spec: &croft_core::FunctionSpec,
    ) -> Result<Vec<(String, String)>> {
        spec.grants
            .iter()
            .map(|grant| {
                let record = Self::record_of(state, grant.table.name())?;
                let arn: String = record.get_attribute(ATTR_ARN).ok_or_else(|| {
                    CloudError::StateError(format!(
                        "table {} has no recorded ARN",
                        grant.table.name()
                    ))
                })?;
                Ok((grant.table.name().to_string(), arn))
            })
            .collect()
    }

    /// Whether a bundle sync would change anything compared to the
    /// recorded objects of the previous deployment.
    fn deployment_is_current(
        state: &GlobalState,
        spec: &croft_core::BucketDeploymentSpec,
    ) -> Result<bool> {
        let Some(record) = state.find_record(&spec.name) else {
            return Ok(false);
        };
        let previous: HashMap<String, String> =
            record.get_attribute(ATTR_OBJECTS).unwrap_or_default();
        let current = bundle_digests(&spec.source_dir)?;
        Ok(previous == current)
    }

    async fn apply_resource(
        &self,
        manifest: &StackManifest,
        resource: &Resource,
        state: &mut GlobalState,
    ) -> Result<String> {
        match resource {
            Resource::Table(spec) => {
                let arn = self.tables.create(spec).await?;
                state.stack_mut(&manifest.name).record(
                    ResourceRecord::new(&spec.name, ResourceKind::Table, &spec.name)
                        .with_attribute(ATTR_ARN, serde_json::json!(arn)),
                );
                Ok(format!("table {} created", spec.name))
            }

            Resource::Function(spec) => {
                let table_arns = Self::table_arns(state, spec)?;
                let role_name = format!("{}-role", spec.name);
                let role_arn = self
                    .roles
                    .create_execution_role(&role_name, spec, &table_arns)
                    .await?;

                let zip_bytes = tokio::fs::read(&spec.artifact.zip).await.map_err(|_| {
                    CloudError::MissingArtifact(format!(
                        "{} (run `cargo xtask package` first)",
                        spec.artifact.zip.display()
                    ))
                })?;
                let arn = self.functions.create(spec, &role_arn, zip_bytes).await?;

                state.stack_mut(&manifest.name).record(
                    ResourceRecord::new(&spec.name, ResourceKind::Function, &spec.name)
                        .with_attribute(ATTR_ARN, serde_json::json!(arn))
                        .with_attribute(ATTR_ROLE_NAME, serde_json::json!(role_name))
                        .with_attribute(ATTR_ROLE_ARN, serde_json::json!(role_arn)),
                );

                if spec.invoke_once_on_deploy {
                    // Recorded before invoking so a failed seed still
                    // leaves the function reachable for teardown.
                    self.functions.invoke_once(&spec.name).await?;
                    if let Some(record) =
                        state.stack_mut(&manifest.name).get_mut(&spec.name)
                    {
                        record.set_attribute(ATTR_SEEDED, serde_json::json!(true));
                    }
                    return Ok(format!("function {} created and seeded", spec.name));
                }
                Ok(format!("function {} created", spec.name))
            }

            Resource::UserPool(spec) => {
                let pool = self.pools.create_pool(spec).await?;
                state.stack_mut(&manifest.name).record(
                    ResourceRecord::new(&spec.name, ResourceKind::UserPool, &pool.id)
                        .with_attribute(ATTR_ARN, serde_json::json!(pool.arn)),
                );
                Ok(format!("user pool {} created", spec.name))
            }

            Resource::UserPoolClient(spec) => {
                let pool_id = Self::record_of(state, &spec.user_pool)?.physical_id.clone();
                let client_id = self.pools.create_client(&pool_id, spec).await?;
                state.stack_mut(&manifest.name).record(
                    ResourceRecord::new(&spec.name, ResourceKind::UserPoolClient, client_id)
                        .with_attribute(ATTR_POOL_ID, serde_json::json!(pool_id)),
                );
                Ok(format!("app client {} created", spec.name))
            }

            Resource::RestApi {
                spec,
                authorizer,
                routes,
            } => {
                let pool_arns: Vec<String> = authorizer
                    .user_pools
                    .iter()
                    .map(|pool| {
                        Self::record_of(state, pool)?
                            .get_attribute::<String>(ATTR_ARN)
                            .ok_or_else(|| {
                                CloudError::StateError(format!(
                                    "user pool {pool} has no recorded ARN"
                                ))
                            })
                    })
                    .collect::<Result<_>>()?;

                let function_arns: HashMap<String, String> = routes
                    .walk()
                    .iter()
                    .map(|(_, binding)| {
                        let arn = Self::record_of(state, &binding.function)?
                            .get_attribute::<String>(ATTR_ARN)
                            .ok_or_else(|| {
                                CloudError::StateError(format!(
                                    "function {} has no recorded ARN",
                                    binding.function
                                ))
                            })?;
                        Ok((binding.function.clone(), arn))
                    })
                    .collect::<Result<_>>()?;

                let api = self
                    .gateways
                    .create(
                        spec,
                        &authorizer.name,
                        &pool_arns,
                        routes,
                        &function_arns,
                        &self.functions,
                    )
                    .await?;
                state.stack_mut(&manifest.name).record(
                    ResourceRecord::new(&spec.name, ResourceKind::RestApi, &api.id)
                        .with_attribute(ATTR_INVOKE_URL, serde_json::json!(api.invoke_url)),
                );
                Ok(format!("rest api {} deployed at {}", spec.name, api.invoke_url))
            }

            Resource::Bucket(spec) => {
                self.buckets.create(spec).await?;
                state.stack_mut(&manifest.name).record(ResourceRecord::new(
                    &spec.name,
                    ResourceKind::Bucket,
                    &spec.bucket_name,
                ));
                Ok(format!("bucket {} created", spec.bucket_name))
            }

            Resource::OriginAccessIdentity(spec) => {
                let bucket = Self::record_of(state, &spec.read_bucket)?
                    .physical_id
                    .clone();
                let identity = self.cdn.create_identity(&spec.name).await?;
                self.buckets
                    .allow_identity_read(&bucket, &identity.canonical_user_id)
                    .await?;
                state.stack_mut(&manifest.name).record(
                    ResourceRecord::new(
                        &spec.name,
                        ResourceKind::OriginAccessIdentity,
                        &identity.id,
                    )
                    .with_attribute(
                        ATTR_CANONICAL_USER,
                        serde_json::json!(identity.canonical_user_id),
                    ),
                );
                Ok(format!("origin access identity {} created", spec.name))
            }

            Resource::Distribution(spec) => {
                let bucket = Self::record_of(state, &spec.origin_bucket)?
                    .physical_id
                    .clone();
                let identity_id = Self::record_of(state, &spec.origin_access_identity)?
                    .physical_id
                    .clone();
                let distribution = self
                    .cdn
                    .create_distribution(spec, &bucket, &identity_id)
                    .await?;
                state.stack_mut(&manifest.name).record(
                    ResourceRecord::new(
                        &spec.name,
                        ResourceKind::Distribution,
                        &distribution.id,
                    )
                    .with_attribute(ATTR_DOMAIN, serde_json::json!(distribution.domain_name)),
                );
                Ok(format!(
                    "distribution {} created at https://{}",
                    spec.name, distribution.domain_name
                ))
            }

            Resource::BucketDeployment(spec) => {
                let bucket = Self::record_of(state, &spec.bucket)?.physical_id.clone();
                let distribution_id =
                    Self::record_of(state, &spec.distribution)?.physical_id.clone();

                let previous: HashMap<String, String> = state
                    .find_record(&spec.name)
                    .and_then(|r| r.get_attribute(ATTR_OBJECTS))
                    .unwrap_or_default();
                let outcome = self
                    .buckets
                    .sync_dir(&bucket, &spec.source_dir, &previous)
                    .await?;

                // Only a changed bundle invalidates the cache; an
                // unchanged one must not churn validators.
                if outcome.changed() {
                    self.cdn.invalidate_all(&distribution_id).await?;
                }

                let objects = serde_json::json!(outcome.objects);
                let stack_state = state.stack_mut(&manifest.name);
                match stack_state.get_mut(&spec.name) {
                    Some(record) => record.set_attribute(ATTR_OBJECTS, objects),
                    None => stack_state.record(
                        ResourceRecord::new(
                            &spec.name,
                            ResourceKind::BucketDeployment,
                            &bucket,
                        )
                        .with_attribute(ATTR_OBJECTS, objects),
                    ),
                }
                Ok(format!(
                    "bundle synced ({} uploaded, {} deleted)",
                    outcome.uploaded, outcome.deleted
                ))
            }
        }
    }

    async fn destroy_record(&self, record: &ResourceRecord) -> Result<String> {
        match record.kind {
            ResourceKind::Table => {
                self.tables.delete(&record.physical_id).await?;
                Ok(format!("table {} deleted", record.physical_id))
            }
            ResourceKind::Function => {
                self.functions.delete(&record.physical_id).await?;
                if let Some(role_name) = record.get_attribute::<String>(ATTR_ROLE_NAME) {
                    self.roles.delete_execution_role(&role_name).await?;
                }
                Ok(format!("function {} deleted", record.logical_name))
            }
            ResourceKind::UserPool => {
                self.pools.delete_pool(&record.physical_id).await?;
                Ok(format!("user pool {} deleted", record.logical_name))
            }
            ResourceKind::UserPoolClient => {
                let pool_id: String =
                    record.get_attribute(ATTR_POOL_ID).ok_or_else(|| {
                        CloudError::StateError(format!(
                            "app client {} has no recorded pool id",
                            record.logical_name
                        ))
                    })?;
                self.pools
                    .delete_client(&pool_id, &record.physical_id)
                    .await?;
                Ok(format!("app client {} deleted", record.logical_name))
            }
            ResourceKind::RestApi => {
                self.gateways.delete(&record.physical_id).await?;
                Ok(format!("rest api {} deleted", record.logical_name))
            }
            ResourceKind::Bucket => {
                self.buckets.empty_and_delete(&record.physical_id).await?;
                Ok(format!("bucket {} deleted", record.physical_id))
            }
            ResourceKind::OriginAccessIdentity => {
                self.cdn.delete_identity(&record.physical_id).await?;
                Ok(format!(
                    "origin access identity {} deleted",
                    record.logical_name
                ))
            }
            ResourceKind::Distribution => {
                self.cdn.delete_distribution(&record.physical_id).await?;
                Ok(format!("distribution {} deleted", record.logical_name))
            }
            ResourceKind::BucketDeployment => {
                // Objects go away with the bucket.
                Ok(format!("deployment {} released", record.logical_name))
            }
        }
    }
}

#[async_trait]
impl CloudProvider for AwsProvider {
    fn name(&self) -> &str {
        "aws"
    }

    fn display_name(&self) -> &str {
        "Amazon Web Services"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        let Some(provider) = self.config.credentials_provider() else {
            return Ok(AuthStatus::failed("no credentials provider configured"));
        };
        match provider.provide_credentials().await {
            Ok(credentials) => Ok(AuthStatus::ok(format!(
                "access key {}",
                credentials.access_key_id()
            ))),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn plan(&self, manifest: &StackManifest, state: &GlobalState) -> Result<Plan> {
        let mut actions = Vec::new();
        for resource in &manifest.resources {
            let provisioned = state.find_record(resource.logical_name()).is_some();
            let action = match resource {
                // A deployment re-runs whenever the bundle changed.
                Resource::BucketDeployment(spec) => {
                    if provisioned && Self::deployment_is_current(state, spec)? {
                        Action::noop(resource.kind(), resource.logical_name())
                    } else {
                        Action::create(resource.kind(), resource.logical_name())
                    }
                }
                _ if provisioned => Action::noop(resource.kind(), resource.logical_name()),
                _ => Action::create(resource.kind(), resource.logical_name()),
            };
            actions.push(action);
        }
        Ok(Plan::new(manifest.name.clone(), actions))
    }

    async fn apply(
        &self,
        manifest: &StackManifest,
        plan: &Plan,
        state: &mut GlobalState,
    ) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for action in &plan.actions {
            if action.action_type != ActionType::Create {
                continue;
            }
            let Some(resource) = manifest.resource(&action.resource_name) else {
                result.add_failure(
                    action.id.clone(),
                    format!("{} is not declared in {}", action.resource_name, manifest.name),
                );
                break;
            };

            tracing::info!(
                stack = %manifest.name,
                resource = %action.resource_name,
                "applying"
            );
            match self.apply_resource(manifest, resource, state).await {
                Ok(message) => result.add_success(action.id.clone(), message),
                Err(e) => {
                    // Provisioning failures abort the stack; resources
                    // already applied stay recorded.
                    result.add_failure(action.id.clone(), e.to_string());
                    break;
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn destroy_stack(
        &self,
        stack_name: &str,
        state: &mut GlobalState,
    ) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        let records = state
            .stack(stack_name)
            .map(|s| s.reverse_order())
            .unwrap_or_default();

        for record in records {
            tracing::info!(
                stack = %stack_name,
                resource = %record.logical_name,
                "destroying"
            );
            match self.destroy_record(&record).await {
                Ok(message) => {
                    if let Some(stack_state) = state.stacks.get_mut(stack_name) {
                        stack_state.remove(&record.logical_name);
                    }
                    result.add_success(format!("delete-{}", record.logical_name), message);
                }
                Err(e) => {
                    result.add_failure(
                        format!("delete-{}", record.logical_name),
                        e.to_string(),
                    );
                }
            }
        }

        if state.stack(stack_name).is_some_and(|s| s.resources.is_empty()) {
            state.remove_stack(stack_name);
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}
