//! Frontend stack
//!
//! Declares a private bucket, the access identity that alone may read
//! it, the HTTPS-only distribution in front, and the deployment step
//! that uploads the pre-built bundle and invalidates the cache.

use crate::app::AppConfig;
use crate::error::Result;
use crate::model::{
    BucketDeploymentSpec, BucketEncryption, BucketSpec, DistributionSpec,
    OriginAccessIdentitySpec, PublicAccessBlock, TeardownPolicy, ViewerProtocolPolicy,
};
use crate::naming::{bucket_physical_name, resource_name};
use crate::stack::{Resource, StackManifest};

pub struct FrontendStack {
    pub manifest: StackManifest,
}

impl FrontendStack {
    pub fn stack_name(prefix: &str) -> String {
        resource_name(prefix, "FrontendStack")
    }

    pub fn compose(config: &AppConfig) -> Result<Self> {
        let prefix = config.prefix.as_str();
        let mut manifest = StackManifest::new(Self::stack_name(prefix), prefix);

        let bucket_name = resource_name(prefix, "FrontendBucket");
        manifest.push(Resource::Bucket(BucketSpec {
            name: bucket_name.clone(),
            bucket_name: bucket_physical_name(prefix, "FrontendBucket"),
            public_access: PublicAccessBlock::block_all(),
            encryption: BucketEncryption::S3Managed,
            teardown: TeardownPolicy::Destroy,
        }))?;

        let oai_name = resource_name(prefix, "OriginAccessIdentity");
        manifest.push(Resource::OriginAccessIdentity(OriginAccessIdentitySpec {
            name: oai_name.clone(),
            read_bucket: bucket_name.clone(),
        }))?;

        let distribution_name = resource_name(prefix, "CloudFrontDistribution");
        manifest.push(Resource::Distribution(DistributionSpec {
            name: distribution_name.clone(),
            origin_bucket: bucket_name.clone(),
            origin_access_identity: oai_name,
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            default_root_object: "index.html".to_string(),
        }))?;

        manifest.push(Resource::BucketDeployment(BucketDeploymentSpec {
            name: resource_name(prefix, "FrontendDeployment"),
            bucket: bucket_name,
            distribution: distribution_name,
            source_dir: config.frontend_asset_dir.clone(),
        }))?;

        Ok(Self { manifest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose() -> FrontendStack {
        FrontendStack::compose(&AppConfig::new("test").unwrap()).unwrap()
    }

    #[test]
    fn bucket_is_private_encrypted_and_destroyed_on_teardown() {
        let stack = compose();
        let Some(Resource::Bucket(bucket)) = stack.manifest.resource("test-FrontendBucket")
        else {
            panic!("bucket not declared");
        };
        assert!(bucket.public_access.is_fully_blocked());
        assert_eq!(bucket.encryption, BucketEncryption::S3Managed);
        assert!(bucket.teardown.is_destroy());
        assert_eq!(bucket.bucket_name, "test-frontendbucket");
    }

    #[test]
    fn access_identity_reads_the_frontend_bucket() {
        let stack = compose();
        let Some(Resource::OriginAccessIdentity(oai)) =
            stack.manifest.resource("test-OriginAccessIdentity")
        else {
            panic!("access identity not declared");
        };
        assert_eq!(oai.read_bucket, "test-FrontendBucket");
    }

    #[test]
    fn distribution_redirects_to_https_with_index_root() {
        let stack = compose();
        let Some(Resource::Distribution(dist)) =
            stack.manifest.resource("test-CloudFrontDistribution")
        else {
            panic!("distribution not declared");
        };
        assert_eq!(
            dist.viewer_protocol_policy,
            ViewerProtocolPolicy::RedirectToHttps
        );
        assert_eq!(dist.default_root_object, "index.html");
        assert_eq!(dist.origin_bucket, "test-FrontendBucket");
        assert_eq!(dist.origin_access_identity, "test-OriginAccessIdentity");
    }

    #[test]
    fn deployment_targets_bucket_and_distribution() {
        let stack = compose();
        let Some(Resource::BucketDeployment(dep)) =
            stack.manifest.resource("test-FrontendDeployment")
        else {
            panic!("deployment not declared");
        };
        assert_eq!(dep.bucket, "test-FrontendBucket");
        assert_eq!(dep.distribution, "test-CloudFrontDistribution");
    }
}
