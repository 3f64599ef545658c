//! AWS provider for Croft
//!
//! Implements [`croft_cloud::CloudProvider`] on top of the `aws-sdk-*`
//! crates. Each service gets its own thin module; the provider
//! dispatches on the typed resource kind and threads provisioned ids and
//! ARNs through the stack state. No reconciliation intelligence lives
//! here beyond create-if-absent: drift detection and updates are the
//! platform's business, not Croft's.

pub mod apigateway;
pub mod cloudfront;
pub mod cognito;
pub mod dynamodb;
pub mod iam;
pub mod lambda;
pub mod provider;
pub mod s3;

pub use provider::AwsProvider;
