//! Handler function descriptors
//!
//! A handler is a stateless piece of request-processing logic executed by
//! the external compute runtime. The descriptor records where its code
//! lives, how it is entered, which environment it receives, and which
//! table permissions it has been granted. Grants are additive and
//! one-directional: handler → table, never the other way.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::table::TableHandle;

/// Execution runtime of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeKind {
    /// Amazon Linux 2023 custom runtime (Rust binaries ship as `bootstrap`).
    ProvidedAl2023,
    Python312,
}

impl RuntimeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeKind::ProvidedAl2023 => "provided.al2023",
            RuntimeKind::Python312 => "python3.12",
        }
    }
}

/// Location of a handler's packaged code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeArtifact {
    /// Path to the zip archive holding the handler binary.
    pub zip: PathBuf,
}

impl CodeArtifact {
    pub fn zip(path: impl Into<PathBuf>) -> Self {
        Self { zip: path.into() }
    }
}

/// Access level of a table grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableAccess {
    Read,
    Write,
}

/// Permission granted to a handler on one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGrant {
    pub table: TableHandle,
    pub access: TableAccess,
}

/// Declares one handler function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub artifact: CodeArtifact,
    /// Entry point inside the artifact (`bootstrap` for custom runtimes).
    pub handler: String,
    pub runtime: RuntimeKind,
    pub environment: BTreeMap<String, String>,
    pub grants: Vec<TableGrant>,
    /// One-shot semantics: invoke exactly once when the declaring stack
    /// is first deployed, never again on later deployments.
    pub invoke_once_on_deploy: bool,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>, artifact: CodeArtifact) -> Self {
        Self {
            name: name.into(),
            artifact,
            handler: "bootstrap".to_string(),
            runtime: RuntimeKind::ProvidedAl2023,
            environment: BTreeMap::new(),
            grants: Vec::new(),
            invoke_once_on_deploy: false,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn grant_read(mut self, table: &TableHandle) -> Self {
        self.grants.push(TableGrant {
            table: table.clone(),
            access: TableAccess::Read,
        });
        self
    }

    pub fn grant_write(mut self, table: &TableHandle) -> Self {
        self.grants.push(TableGrant {
            table: table.clone(),
            access: TableAccess::Write,
        });
        self
    }

    pub fn invoke_once(mut self) -> Self {
        self.invoke_once_on_deploy = true;
        self
    }

    /// Access levels this function holds on the given table.
    pub fn access_on(&self, table: &TableHandle) -> Vec<TableAccess> {
        self.grants
            .iter()
            .filter(|g| &g.table == table)
            .map(|g| g.access)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::{
        CapacityMode, KeyAttribute, TableEncryption, TableSpec,
    };
    use crate::model::policy::TeardownPolicy;

    fn table() -> TableSpec {
        TableSpec {
            name: "test-ItemsTable".to_string(),
            partition_key: KeyAttribute::string("id"),
            capacity: CapacityMode::OnDemand,
            encryption: TableEncryption::AwsOwned,
            teardown: TeardownPolicy::Destroy,
        }
    }

    #[test]
    fn grants_accumulate_per_table() {
        let handle = table().handle();
        let spec = FunctionSpec::new("test-GetItemFunction", CodeArtifact::zip("a.zip"))
            .grant_read(&handle);

        assert_eq!(spec.access_on(&handle), vec![TableAccess::Read]);
    }

    #[test]
    fn no_grant_means_no_access() {
        let handle = table().handle();
        let spec = FunctionSpec::new("test-HealthCheckFunction", CodeArtifact::zip("a.zip"));
        assert!(spec.access_on(&handle).is_empty());
    }
}
