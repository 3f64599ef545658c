//! CloudFront distribution provisioning
//!
//! The distribution is the only public read path: it reaches the bucket
//! through an origin access identity and redirects plain HTTP viewers
//! to HTTPS. Deletion follows the platform's two-step dance — disable,
//! wait until the change is deployed, then delete.

use std::time::Duration;

use aws_sdk_cloudfront::types::{
    CloudFrontOriginAccessIdentityConfig, CookiePreference, DefaultCacheBehavior,
    DistributionConfig, ForwardedValues, InvalidationBatch, ItemSelection, Origin, Origins, Paths,
    S3OriginConfig, ViewerProtocolPolicy as CfViewerProtocolPolicy,
};
use croft_cloud::{CloudError, Result};
use croft_core::{DistributionSpec, ViewerProtocolPolicy};

const DISABLE_POLL_INTERVAL: Duration = Duration::from_secs(15);
const DISABLE_POLL_ATTEMPTS: u32 = 40;

/// Provisioned identity coordinates recorded in state.
#[derive(Debug, Clone)]
pub struct ProvisionedIdentity {
    pub id: String,
    pub canonical_user_id: String,
}

/// Provisioned distribution coordinates recorded in state.
#[derive(Debug, Clone)]
pub struct ProvisionedDistribution {
    pub id: String,
    pub domain_name: String,
}

pub struct Cdn {
    client: aws_sdk_cloudfront::Client,
    region: String,
}

impl Cdn {
    pub fn new(config: &aws_config::SdkConfig, region: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_cloudfront::Client::new(config),
            region: region.into(),
        }
    }

    fn caller_reference(name: &str) -> String {
        format!("croft-{name}-{}", chrono::Utc::now().timestamp_millis())
    }

    pub async fn create_identity(&self, name: &str) -> Result<ProvisionedIdentity> {
        let config = CloudFrontOriginAccessIdentityConfig::builder()
            .caller_reference(Self::caller_reference(name))
            .comment(name)
            .build()
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;

        let output = self
            .client
            .create_cloud_front_origin_access_identity()
            .cloud_front_origin_access_identity_config(config)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to create access identity {name}: {e}"))
            })?;

        let identity = output
            .cloud_front_origin_access_identity()
            .ok_or_else(|| {
                CloudError::ApiError(format!("access identity {name} not returned"))
            })?;
        tracing::info!(identity = %name, "origin access identity created");
        Ok(ProvisionedIdentity {
            id: identity.id().to_string(),
            canonical_user_id: identity.s3_canonical_user_id().to_string(),
        })
    }

    pub async fn delete_identity(&self, id: &str) -> Result<()> {
        let etag = self
            .client
            .get_cloud_front_origin_access_identity()
            .id(id)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to read access identity {id}: {e}"))
            })?
            .e_tag()
            .unwrap_or_default()
            .to_string();

        self.client
            .delete_cloud_front_origin_access_identity()
            .id(id)
            .if_match(etag)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to delete access identity {id}: {e}"))
            })?;
        Ok(())
    }

    fn viewer_policy(policy: ViewerProtocolPolicy) -> CfViewerProtocolPolicy {
        match policy {
            ViewerProtocolPolicy::RedirectToHttps => CfViewerProtocolPolicy::RedirectToHttps,
            ViewerProtocolPolicy::HttpsOnly => CfViewerProtocolPolicy::HttpsOnly,
            ViewerProtocolPolicy::AllowAll => CfViewerProtocolPolicy::AllowAll,
        }
    }

    /// Creates the distribution in front of the bucket. The distribution
    /// keeps deploying in the background after this returns.
    pub async fn create_distribution(
        &self,
        spec: &DistributionSpec,
        bucket_name: &str,
        identity_id: &str,
    ) -> Result<ProvisionedDistribution> {
        let origin_id = format!("{}-origin", spec.name);
        let origin_domain = format!("{bucket_name}.s3.{}.amazonaws.com", self.region);

        let origin = Origin::builder()
            .id(&origin_id)
            .domain_name(origin_domain)
            .s3_origin_config(
                S3OriginConfig::builder()
                    .origin_access_identity(format!(
                        "origin-access-identity/cloudfront/{identity_id}"
                    ))
                    .build(),
            )
            .build()
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;

        let behavior = DefaultCacheBehavior::builder()
            .target_origin_id(&origin_id)
            .viewer_protocol_policy(Self::viewer_policy(spec.viewer_protocol_policy))
            .forwarded_values(
                ForwardedValues::builder()
                    .query_string(false)
                    .cookies(
                        CookiePreference::builder()
                            .forward(ItemSelection::None)
                            .build()
                            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?,
                    )
                    .build()
                    .map_err(|e| CloudError::InvalidConfig(e.to_string()))?,
            )
            .min_ttl(0)
            .build()
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;

        let config = DistributionConfig::builder()
            .caller_reference(Self::caller_reference(&spec.name))
            .comment(&spec.name)
            .enabled(true)
            .default_root_object(&spec.default_root_object)
            .origins(
                Origins::builder()
                    .quantity(1)
                    .items(origin)
                    .build()
                    .map_err(|e| CloudError::InvalidConfig(e.to_string()))?,
            )
            .default_cache_behavior(behavior)
            .build()
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;

        let output = self
            .client
            .create_distribution()
            .distribution_config(config)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!(
                    "failed to create distribution {}: {e}",
                    spec.name
                ))
            })?;

        let distribution = output.distribution().ok_or_else(|| {
            CloudError::ApiError(format!("distribution {} not returned", spec.name))
        })?;
        tracing::info!(
            distribution = %spec.name,
            domain = %distribution.domain_name(),
            "distribution created"
        );
        Ok(ProvisionedDistribution {
            id: distribution.id().to_string(),
            domain_name: distribution.domain_name().to_string(),
        })
    }

    /// Invalidates every path so changed bundle content is observably
    /// served without manual intervention.
    pub async fn invalidate_all(&self, distribution_id: &str) -> Result<()> {
        let batch = InvalidationBatch::builder()
            .caller_reference(Self::caller_reference(distribution_id))
            .paths(
                Paths::builder()
                    .quantity(1)
                    .items("/*")
                    .build()
                    .map_err(|e| CloudError::InvalidConfig(e.to_string()))?,
            )
            .build()
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;

        self.client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!(
                    "failed to invalidate distribution {distribution_id}: {e}"
                ))
            })?;
        tracing::info!(distribution = %distribution_id, "cache invalidated");
        Ok(())
    }

    /// Disables the distribution, waits for the change to deploy, then
    /// deletes it. The wait is bounded; a distribution still deploying
    /// after that surfaces as an error the caller reports.
    pub async fn delete_distribution(&self, id: &str) -> Result<()> {
        let got = self
            .client
            .get_distribution_config()
            .id(id)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to read distribution {id}: {e}"))
            })?;
        let etag = got.e_tag().unwrap_or_default().to_string();
        let mut config = got
            .distribution_config()
            .cloned()
            .ok_or_else(|| CloudError::ApiError(format!("distribution {id} has no config")))?;

        if config.enabled {
            config.enabled = false;
            self.client
                .update_distribution()
                .id(id)
                .if_match(etag)
                .distribution_config(config)
                .send()
                .await
                .map_err(|e| {
                    CloudError::ApiError(format!("failed to disable distribution {id}: {e}"))
                })?;
            tracing::info!(distribution = %id, "distribution disabled, waiting for deployment");
        }

        self.wait_until_deployed(id).await?;

        let etag = self
            .client
            .get_distribution_config()
            .id(id)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to re-read distribution {id}: {e}"))
            })?
            .e_tag()
            .unwrap_or_default()
            .to_string();

        self.client
            .delete_distribution()
            .id(id)
            .if_match(etag)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to delete distribution {id}: {e}"))
            })?;
        tracing::info!(distribution = %id, "distribution deleted");
        Ok(())
    }

    async fn wait_until_deployed(&self, id: &str) -> Result<()> {
        for _ in 0..DISABLE_POLL_ATTEMPTS {
            let status = self
                .client
                .get_distribution()
                .id(id)
                .send()
                .await
                .map_err(|e| {
                    CloudError::ApiError(format!("failed to read distribution {id}: {e}"))
                })?
                .distribution()
                .map(|d| d.status().to_string())
                .unwrap_or_default();

            if status == "Deployed" {
                return Ok(());
            }
            tokio::time::sleep(DISABLE_POLL_INTERVAL).await;
        }
        Err(CloudError::Timeout(format!(
            "distribution {id} did not finish deploying"
        )))
    }
}
