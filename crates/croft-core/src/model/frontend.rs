//! Bucket, distribution and deployment descriptors
//!
//! The bucket holds the built frontend bundle and is never directly
//! reachable: all public reads flow through the distribution, whose
//! access identity is the only principal granted read on the bucket.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::policy::TeardownPolicy;

/// Public-access block settings of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAccessBlock {
    pub block_public_acls: bool,
    pub block_public_policy: bool,
    pub ignore_public_acls: bool,
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlock {
    /// All four switches on.
    pub fn block_all() -> Self {
        Self {
            block_public_acls: true,
            block_public_policy: true,
            ignore_public_acls: true,
            restrict_public_buckets: true,
        }
    }

    pub fn is_fully_blocked(self) -> bool {
        self.block_public_acls
            && self.block_public_policy
            && self.ignore_public_acls
            && self.restrict_public_buckets
    }
}

/// Server-side encryption mode of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketEncryption {
    /// Provider-managed keys (SSE-S3).
    S3Managed,
    /// KMS-managed keys.
    KmsManaged,
}

/// Declares one private object bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSpec {
    /// Logical name (`${prefix}-FrontendBucket`).
    pub name: String,
    /// Physical name; bucket naming rules are stricter than the shared
    /// convention, so it is derived (lowercased) at synthesis time.
    pub bucket_name: String,
    pub public_access: PublicAccessBlock,
    pub encryption: BucketEncryption,
    pub teardown: TeardownPolicy,
}

/// Declares the identity through which the distribution reads the bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginAccessIdentitySpec {
    pub name: String,
    /// Logical name of the bucket this identity is granted read on.
    pub read_bucket: String,
}

/// Viewer-facing protocol policy of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerProtocolPolicy {
    /// Plain HTTP requests are redirected, never served.
    RedirectToHttps,
    HttpsOnly,
    AllowAll,
}

/// Declares the CDN distribution fronting the bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSpec {
    pub name: String,
    /// Logical name of the origin bucket.
    pub origin_bucket: String,
    /// Logical name of the access identity used for origin reads.
    pub origin_access_identity: String,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub default_root_object: String,
}

/// Declares the upload of a pre-built bundle into the bucket plus the
/// cache invalidation that makes changed content observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketDeploymentSpec {
    pub name: String,
    pub bucket: String,
    pub distribution: String,
    /// Directory holding the pre-built static assets.
    pub source_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_all_blocks_everything() {
        assert!(PublicAccessBlock::block_all().is_fully_blocked());

        let partial = PublicAccessBlock {
            block_public_policy: false,
            ..PublicAccessBlock::block_all()
        };
        assert!(!partial.is_fully_blocked());
    }
}
