//! Croft core
//!
//! Typed provisioning-time descriptors for the resources Croft manages,
//! composed into deployable stacks:
//!
//! - **Database stack**: the items table plus a one-shot seed function.
//! - **Api stack**: a REST gateway, a Cognito user pool with an app
//!   client, and the three request handlers behind `/item/{itemId}`.
//! - **Frontend stack**: a private bucket, a CloudFront distribution and
//!   the bundle deployment step.
//!
//! Descriptors are plain data. Nothing in this crate talks to a cloud;
//! synthesis produces a [`stack::StackManifest`] per stack and a provider
//! crate turns manifests into API calls. Resource order inside a manifest
//! is provisioning order.

pub mod app;
pub mod error;
pub mod model;
pub mod naming;
pub mod stack;

// Re-exports
pub use app::{App, AppConfig};
pub use error::{CoreError, Result};
pub use model::*;
pub use stack::{ITEM_TABLE_ENV, Resource, ResourceKind, StackManifest};
