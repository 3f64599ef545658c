//! Bucket provisioning and bundle sync
//!
//! The frontend bucket is never public: every public-access switch is
//! on and the only read principal is the distribution's origin access
//! identity. The bundle sync is content-addressed so an unchanged
//! bundle re-uploads nothing and leaves validators untouched.

use std::collections::HashMap;
use std::path::Path;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, PublicAccessBlockConfiguration,
    ServerSideEncryption, ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration,
    ServerSideEncryptionRule,
};
use croft_cloud::{CloudError, Result};
use croft_core::{BucketEncryption, BucketSpec};
use sha2::{Digest, Sha256};

/// Outcome of one bundle sync.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// Object key → content digest after the sync.
    pub objects: HashMap<String, String>,
    pub uploaded: usize,
    pub deleted: usize,
}

impl SyncOutcome {
    pub fn changed(&self) -> bool {
        self.uploaded > 0 || self.deleted > 0
    }
}

pub struct Buckets {
    client: aws_sdk_s3::Client,
    region: String,
}

impl Buckets {
    pub fn new(config: &aws_config::SdkConfig, region: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            region: region.into(),
        }
    }

    pub async fn create(&self, spec: &BucketSpec) -> Result<()> {
        let name = &spec.bucket_name;
        let mut request = self.client.create_bucket().bucket(name);
        // us-east-1 rejects an explicit location constraint.
        if self.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request.send().await.map_err(|e| {
            CloudError::ApiError(format!("failed to create bucket {name}: {e}"))
        })?;

        self.client
            .put_public_access_block()
            .bucket(name)
            .public_access_block_configuration(
                PublicAccessBlockConfiguration::builder()
                    .block_public_acls(spec.public_access.block_public_acls)
                    .ignore_public_acls(spec.public_access.ignore_public_acls)
                    .block_public_policy(spec.public_access.block_public_policy)
                    .restrict_public_buckets(spec.public_access.restrict_public_buckets)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!(
                    "failed to set public access block on {name}: {e}"
                ))
            })?;

        let algorithm = match spec.encryption {
            BucketEncryption::S3Managed => ServerSideEncryption::Aes256,
            BucketEncryption::KmsManaged => ServerSideEncryption::AwsKms,
        };
        self.client
            .put_bucket_encryption()
            .bucket(name)
            .server_side_encryption_configuration(
                ServerSideEncryptionConfiguration::builder()
                    .rules(
                        ServerSideEncryptionRule::builder()
                            .apply_server_side_encryption_by_default(
                                ServerSideEncryptionByDefault::builder()
                                    .sse_algorithm(algorithm)
                                    .build()
                                    .map_err(|e| CloudError::InvalidConfig(e.to_string()))?,
                            )
                            .build(),
                    )
                    .build()
                    .map_err(|e| CloudError::InvalidConfig(e.to_string()))?,
            )
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to set encryption on {name}: {e}"))
            })?;

        tracing::info!(bucket = %name, "bucket created");
        Ok(())
    }

    /// Grants read on every object to the identity's canonical user —
    /// and to nobody else.
    pub async fn allow_identity_read(
        &self,
        bucket: &str,
        canonical_user_id: &str,
    ) -> Result<()> {
        let policy = serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": { "CanonicalUser": canonical_user_id },
                    "Action": "s3:GetObject",
                    "Resource": format!("arn:aws:s3:::{bucket}/*"),
                }
            ]
        });
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy.to_string())
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to set bucket policy on {bucket}: {e}"))
            })?;
        Ok(())
    }

    /// Uploads the bundle, skipping objects whose digest matches the
    /// previous sync and deleting objects that left the bundle.
    pub async fn sync_dir(
        &self,
        bucket: &str,
        dir: &Path,
        previous: &HashMap<String, String>,
    ) -> Result<SyncOutcome> {
        let files = local_bundle(dir)?;
        let mut uploaded = 0;

        for (key, (path, digest)) in &files {
            if previous.get(key) == Some(digest) {
                continue;
            }
            let body = ByteStream::from_path(path).await.map_err(|e| {
                CloudError::ApiError(format!("failed to read {}: {e}", path.display()))
            })?;
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .content_type(content_type_of(key))
                .send()
                .await
                .map_err(|e| {
                    CloudError::ApiError(format!("failed to upload {key}: {e}"))
                })?;
            uploaded += 1;
            tracing::debug!(key = %key, "object uploaded");
        }

        let mut deleted = 0;
        for stale in previous.keys().filter(|k| !files.contains_key(*k)) {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(stale)
                .send()
                .await
                .map_err(|e| {
                    CloudError::ApiError(format!("failed to delete object {stale}: {e}"))
                })?;
            deleted += 1;
        }

        let objects = files
            .into_iter()
            .map(|(key, (_, digest))| (key, digest))
            .collect();
        Ok(SyncOutcome {
            objects,
            uploaded,
            deleted,
        })
    }

    /// Removes every object, then the bucket itself.
    pub async fn empty_and_delete(&self, bucket: &str) -> Result<()> {
        loop {
            let listing = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .send()
                .await
                .map_err(|e| {
                    CloudError::ApiError(format!("failed to list bucket {bucket}: {e}"))
                })?;

            let keys: Vec<String> = listing
                .contents()
                .iter()
                .filter_map(|o| o.key().map(str::to_string))
                .collect();
            if keys.is_empty() {
                break;
            }
            for key in keys {
                self.client
                    .delete_object()
                    .bucket(bucket)
                    .key(&key)
                    .send()
                    .await
                    .map_err(|e| {
                        CloudError::ApiError(format!("failed to delete object {key}: {e}"))
                    })?;
            }
            if !listing.is_truncated().unwrap_or(false) {
                break;
            }
        }

        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                CloudError::ApiError(format!("failed to delete bucket {bucket}: {e}"))
            })?;
        tracing::info!(bucket = %bucket, "bucket deleted");
        Ok(())
    }
}

/// Digests of the local bundle, used by plan to decide whether a sync
/// would change anything.
pub fn bundle_digests(dir: &Path) -> Result<HashMap<String, String>> {
    Ok(local_bundle(dir)?
        .into_iter()
        .map(|(key, (_, digest))| (key, digest))
        .collect())
}

/// Collects the bundle as `key → (path, sha256)`.
fn local_bundle(dir: &Path) -> Result<HashMap<String, (std::path::PathBuf, String)>> {
    if !dir.is_dir() {
        return Err(CloudError::MissingArtifact(format!(
            "frontend bundle directory {} does not exist",
            dir.display()
        )));
    }

    let pattern = format!("{}/**/*", dir.display());
    let mut files = HashMap::new();
    for entry in glob::glob(&pattern)
        .map_err(|e| CloudError::InvalidConfig(format!("bad bundle pattern: {e}")))?
    {
        let path = entry.map_err(|e| CloudError::Io(e.into_error()))?;
        if !path.is_file() {
            continue;
        }
        let key = path
            .strip_prefix(dir)
            .expect("glob stays under the bundle root")
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let bytes = std::fs::read(&path)?;
        let digest = format!("{:x}", Sha256::digest(&bytes));
        files.insert(key, (path, digest));
    }
    Ok(files)
}

/// Content type by extension; the distribution serves these as-is.
fn content_type_of(key: &str) -> &'static str {
    match key.rsplit('.').next().unwrap_or_default() {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" | "map" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_the_usual_bundle() {
        assert_eq!(content_type_of("index.html"), "text/html");
        assert_eq!(content_type_of("static/js/main.3f2a.js"), "application/javascript");
        assert_eq!(content_type_of("asset-manifest.json"), "application/json");
        assert_eq!(content_type_of("favicon.ico"), "image/x-icon");
        assert_eq!(content_type_of("LICENSE"), "application/octet-stream");
    }

    #[test]
    fn local_bundle_digests_are_stable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::create_dir_all(dir.path().join("static")).unwrap();
        std::fs::write(dir.path().join("static/app.js"), "let x = 1;").unwrap();

        let first = local_bundle(dir.path()).unwrap();
        let second = local_bundle(dir.path()).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.contains_key("index.html"));
        assert!(first.contains_key("static/app.js"));
        assert_eq!(
            first.get("index.html").map(|(_, d)| d.clone()),
            second.get("index.html").map(|(_, d)| d.clone())
        );
    }

    #[test]
    fn missing_bundle_directory_is_reported() {
        let err = local_bundle(Path::new("/nonexistent/bundle")).unwrap_err();
        assert!(matches!(err, CloudError::MissingArtifact(_)));
    }
}
