//! App orchestrator
//!
//! Composes the three stacks under one shared naming prefix, passes the
//! database stack's table handle into the api stack, and records the
//! explicit api → database ordering dependency. The dependency is
//! declared even though the handle already crosses the boundary:
//! handle-passing alone is not trusted to induce ordering.

use std::path::PathBuf;

use crate::error::{CoreError, Result};
use crate::naming::validate_prefix;
use crate::stack::{ApiStack, DatabaseStack, FrontendStack, StackManifest};

/// Configuration shared by every stack.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Shared naming prefix; the only cross-stack contract besides the
    /// table handle.
    pub prefix: String,
    /// Directory holding the packaged handler zips (`xtask package`).
    pub lambda_artifact_dir: PathBuf,
    /// Directory holding the pre-built frontend bundle.
    pub frontend_asset_dir: PathBuf,
}

impl AppConfig {
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self {
            prefix,
            lambda_artifact_dir: PathBuf::from("target/lambda"),
            frontend_asset_dir: PathBuf::from("frontend/build"),
        })
    }

    pub fn with_lambda_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lambda_artifact_dir = dir.into();
        self
    }

    pub fn with_frontend_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.frontend_asset_dir = dir.into();
        self
    }

    pub fn lambda_artifact(&self, name: &str) -> crate::model::CodeArtifact {
        crate::model::CodeArtifact::zip(self.lambda_artifact_dir.join(format!("{name}.zip")))
    }
}

/// The composed application: three stacks in dependency order.
pub struct App {
    pub database: DatabaseStack,
    pub api: ApiStack,
    pub frontend: FrontendStack,
}

impl App {
    pub fn compose(config: &AppConfig) -> Result<Self> {
        let database = DatabaseStack::compose(config)?;
        let mut api = ApiStack::compose(config, database.items_table.clone())?;
        api.manifest.add_dependency(&database.manifest);
        let frontend = FrontendStack::compose(config)?;

        Ok(Self {
            database,
            api,
            frontend,
        })
    }

    pub fn manifests(&self) -> [&StackManifest; 3] {
        [
            &self.database.manifest,
            &self.api.manifest,
            &self.frontend.manifest,
        ]
    }

    pub fn manifest(&self, stack_name: &str) -> Result<&StackManifest> {
        self.manifests()
            .into_iter()
            .find(|m| m.name == stack_name)
            .ok_or_else(|| CoreError::UnknownStack(stack_name.to_string()))
    }

    /// Stacks in an order that satisfies every declared dependency
    /// (Kahn's algorithm; deterministic because candidates are taken in
    /// declaration order).
    pub fn deploy_order(&self) -> Result<Vec<&StackManifest>> {
        let manifests = self.manifests();
        let mut placed: Vec<&StackManifest> = Vec::with_capacity(manifests.len());
        let mut remaining: Vec<&StackManifest> = manifests.to_vec();

        while !remaining.is_empty() {
            let ready = remaining.iter().position(|m| {
                m.depends_on
                    .iter()
                    .all(|dep| placed.iter().any(|p| &p.name == dep))
            });
            match ready {
                Some(i) => placed.push(remaining.remove(i)),
                None => {
                    let stuck: Vec<_> =
                        remaining.iter().map(|m| m.name.as_str()).collect();
                    return Err(CoreError::DependencyCycle(stuck.join(", ")));
                }
            }
        }
        Ok(placed)
    }

    /// Reverse deploy order, used for teardown.
    pub fn destroy_order(&self) -> Result<Vec<&StackManifest>> {
        let mut order = self.deploy_order()?;
        order.reverse();
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::compose(&AppConfig::new("test").unwrap()).unwrap()
    }

    #[test]
    fn api_depends_on_database_explicitly() {
        let app = app();
        assert_eq!(app.api.manifest.depends_on, vec!["test-DatabaseStack"]);
        assert!(app.database.manifest.depends_on.is_empty());
        assert!(app.frontend.manifest.depends_on.is_empty());
    }

    #[test]
    fn deploy_order_puts_database_before_api() {
        let app = app();
        let names: Vec<_> = app
            .deploy_order()
            .unwrap()
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["test-DatabaseStack", "test-ApiStack", "test-FrontendStack"]
        );
    }

    #[test]
    fn destroy_order_is_reversed() {
        let app = app();
        let names: Vec<_> = app
            .destroy_order()
            .unwrap()
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["test-FrontendStack", "test-ApiStack", "test-DatabaseStack"]
        );
    }

    #[test]
    fn api_handlers_reference_the_database_table() {
        let app = app();
        let table = &app.database.items_table;
        let get = app
            .api
            .manifest
            .functions()
            .find(|f| f.name == "test-GetItemFunction")
            .unwrap();
        assert_eq!(
            get.environment.get(crate::stack::ITEM_TABLE_ENV).unwrap(),
            table.name()
        );
    }

    #[test]
    fn rejects_invalid_prefix() {
        assert!(AppConfig::new("bad prefix").is_err());
    }
}
