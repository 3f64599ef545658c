//! Stacks: independently deployable groups of resource descriptors
//!
//! A [`StackManifest`] is the synthesis output a provider consumes. The
//! resource list preserves declaration order, and declaration order is
//! provisioning order: a resource may only reference resources that
//! appear before it in the same manifest (or a handle passed in from
//! another stack).

mod api;
mod database;
mod frontend;

pub use api::ApiStack;
pub use database::DatabaseStack;
pub use frontend::FrontendStack;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::{
    AuthorizerSpec, BucketDeploymentSpec, BucketSpec, DistributionSpec, FunctionSpec,
    OriginAccessIdentitySpec, RestApiSpec, RouteNode, TableSpec, UserPoolClientSpec, UserPoolSpec,
};

/// Environment variable through which handlers receive the provisioned
/// table name.
pub const ITEM_TABLE_ENV: &str = "ITEM_TABLE";

/// One declared resource. Variants carry the typed descriptor; the
/// gateway is composite because its authorizer and route tree cannot
/// exist apart from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Resource {
    Table(TableSpec),
    Function(FunctionSpec),
    UserPool(UserPoolSpec),
    UserPoolClient(UserPoolClientSpec),
    RestApi {
        spec: RestApiSpec,
        authorizer: AuthorizerSpec,
        routes: RouteNode,
    },
    Bucket(BucketSpec),
    OriginAccessIdentity(OriginAccessIdentitySpec),
    Distribution(DistributionSpec),
    BucketDeployment(BucketDeploymentSpec),
}

/// Resource kind tag, used for state records and plan output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Table,
    Function,
    UserPool,
    UserPoolClient,
    RestApi,
    Bucket,
    OriginAccessIdentity,
    Distribution,
    BucketDeployment,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceKind::Table => "table",
            ResourceKind::Function => "function",
            ResourceKind::UserPool => "user-pool",
            ResourceKind::UserPoolClient => "user-pool-client",
            ResourceKind::RestApi => "rest-api",
            ResourceKind::Bucket => "bucket",
            ResourceKind::OriginAccessIdentity => "origin-access-identity",
            ResourceKind::Distribution => "distribution",
            ResourceKind::BucketDeployment => "bucket-deployment",
        };
        f.write_str(s)
    }
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Table(_) => ResourceKind::Table,
            Resource::Function(_) => ResourceKind::Function,
            Resource::UserPool(_) => ResourceKind::UserPool,
            Resource::UserPoolClient(_) => ResourceKind::UserPoolClient,
            Resource::RestApi { .. } => ResourceKind::RestApi,
            Resource::Bucket(_) => ResourceKind::Bucket,
            Resource::OriginAccessIdentity(_) => ResourceKind::OriginAccessIdentity,
            Resource::Distribution(_) => ResourceKind::Distribution,
            Resource::BucketDeployment(_) => ResourceKind::BucketDeployment,
        }
    }

    pub fn logical_name(&self) -> &str {
        match self {
            Resource::Table(s) => &s.name,
            Resource::Function(s) => &s.name,
            Resource::UserPool(s) => &s.name,
            Resource::UserPoolClient(s) => &s.name,
            Resource::RestApi { spec, .. } => &spec.name,
            Resource::Bucket(s) => &s.name,
            Resource::OriginAccessIdentity(s) => &s.name,
            Resource::Distribution(s) => &s.name,
            Resource::BucketDeployment(s) => &s.name,
        }
    }
}

/// Synthesis output of one stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackManifest {
    /// Stack name (`${prefix}-DatabaseStack`).
    pub name: String,
    /// Shared naming prefix the stack was composed with.
    pub prefix: String,
    /// Declared resources, in provisioning order.
    pub resources: Vec<Resource>,
    /// Names of stacks that must be fully provisioned before this one.
    pub depends_on: Vec<String>,
}

impl StackManifest {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            resources: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    /// Appends a resource, rejecting duplicate logical names.
    pub fn push(&mut self, resource: Resource) -> Result<()> {
        if self.resource(resource.logical_name()).is_some() {
            return Err(CoreError::DuplicateResource(
                resource.logical_name().to_string(),
                self.name.clone(),
            ));
        }
        tracing::debug!(
            stack = %self.name,
            kind = %resource.kind(),
            name = %resource.logical_name(),
            "declared resource"
        );
        self.resources.push(resource);
        Ok(())
    }

    pub fn resource(&self, logical_name: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.logical_name() == logical_name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.resources.iter().filter_map(|r| match r {
            Resource::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn add_dependency(&mut self, stack: &StackManifest) {
        if !self.depends_on.contains(&stack.name) {
            self.depends_on.push(stack.name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CapacityMode, KeyAttribute, TableEncryption, TeardownPolicy,
    };

    fn table(name: &str) -> Resource {
        Resource::Table(TableSpec {
            name: name.to_string(),
            partition_key: KeyAttribute::string("id"),
            capacity: CapacityMode::OnDemand,
            encryption: TableEncryption::AwsOwned,
            teardown: TeardownPolicy::Destroy,
        })
    }

    #[test]
    fn push_preserves_declaration_order() {
        let mut manifest = StackManifest::new("test-DatabaseStack", "test");
        manifest.push(table("a")).unwrap();
        manifest.push(table("b")).unwrap();

        let names: Vec<_> = manifest.resources.iter().map(|r| r.logical_name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn duplicate_logical_names_are_rejected() {
        let mut manifest = StackManifest::new("test-DatabaseStack", "test");
        manifest.push(table("a")).unwrap();
        let err = manifest.push(table("a")).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateResource(..)));
    }

    #[test]
    fn manifest_roundtrips_through_json() {
        let mut manifest = StackManifest::new("test-DatabaseStack", "test");
        manifest.push(table("test-ItemsTable")).unwrap();

        let json = serde_json::to_string(&manifest).unwrap();
        let back: StackManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
