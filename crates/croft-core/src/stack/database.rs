//! Database stack
//!
//! Declares the items table and the one-shot seed function that
//! guarantees the table is non-empty immediately after the first
//! successful deployment. The seed function is granted write-only
//! access and is never re-invoked by later deployments.

use crate::app::AppConfig;
use crate::error::Result;
use crate::model::{
    CapacityMode, FunctionSpec, KeyAttribute, TableEncryption, TableHandle, TableSpec,
    TeardownPolicy,
};
use crate::naming::resource_name;
use crate::stack::{ITEM_TABLE_ENV, Resource, StackManifest};

pub struct DatabaseStack {
    pub manifest: StackManifest,
    /// Handle other stacks use for grants and name injection.
    pub items_table: TableHandle,
}

impl DatabaseStack {
    pub fn stack_name(prefix: &str) -> String {
        resource_name(prefix, "DatabaseStack")
    }

    pub fn compose(config: &AppConfig) -> Result<Self> {
        let prefix = config.prefix.as_str();
        let mut manifest = StackManifest::new(Self::stack_name(prefix), prefix);

        let table = TableSpec {
            name: resource_name(prefix, "ItemsTable"),
            partition_key: KeyAttribute::string("id"),
            capacity: CapacityMode::OnDemand,
            encryption: TableEncryption::AwsOwned,
            teardown: TeardownPolicy::Destroy,
        };
        let items_table = table.handle();
        manifest.push(Resource::Table(table))?;

        // Seed task: table must exist first, hence declared after it.
        let seed = FunctionSpec::new(
            resource_name(prefix, "PopulateDatabaseFunction"),
            config.lambda_artifact("populate_database"),
        )
        .with_env(ITEM_TABLE_ENV, items_table.name())
        .grant_write(&items_table)
        .invoke_once();
        manifest.push(Resource::Function(seed))?;

        Ok(Self {
            manifest,
            items_table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableAccess;

    fn config() -> AppConfig {
        AppConfig::new("test").unwrap()
    }

    #[test]
    fn declares_table_before_seed_function() {
        let stack = DatabaseStack::compose(&config()).unwrap();
        let kinds: Vec<_> = stack
            .manifest
            .resources
            .iter()
            .map(|r| r.logical_name().to_string())
            .collect();
        assert_eq!(
            kinds,
            vec!["test-ItemsTable", "test-PopulateDatabaseFunction"]
        );
    }

    #[test]
    fn table_teardown_is_destroy() {
        let stack = DatabaseStack::compose(&config()).unwrap();
        let Some(Resource::Table(table)) = stack.manifest.resource("test-ItemsTable") else {
            panic!("items table not declared");
        };
        assert!(table.teardown.is_destroy());
        assert_eq!(table.partition_key, KeyAttribute::string("id"));
        assert_eq!(table.capacity, CapacityMode::OnDemand);
    }

    #[test]
    fn seed_function_is_write_only_and_one_shot() {
        let stack = DatabaseStack::compose(&config()).unwrap();
        let Some(Resource::Function(seed)) =
            stack.manifest.resource("test-PopulateDatabaseFunction")
        else {
            panic!("seed function not declared");
        };
        assert!(seed.invoke_once_on_deploy);
        assert_eq!(
            seed.access_on(&stack.items_table),
            vec![TableAccess::Write]
        );
        assert_eq!(
            seed.environment.get(ITEM_TABLE_ENV).map(String::as_str),
            Some("test-ItemsTable")
        );
    }
}
