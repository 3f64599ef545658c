//! Key-value table descriptors

use serde::{Deserialize, Serialize};

use super::policy::TeardownPolicy;

/// Scalar type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Number,
    Binary,
}

/// A key attribute (name + scalar type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAttribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl KeyAttribute {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::String,
        }
    }
}

/// Capacity mode of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    /// Pay-per-request, no capacity planning.
    OnDemand,
    /// Fixed read/write capacity units.
    Provisioned { read: u32, write: u32 },
}

/// Encryption-at-rest mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableEncryption {
    /// Server-side encryption with a provider-owned key.
    AwsOwned,
    /// Server-side encryption with a provider-managed KMS key.
    AwsManaged,
}

/// Declares one key-value table.
///
/// The partition key is immutable once the table is created; the table
/// name must be unique within the target account and region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub capacity: CapacityMode,
    pub encryption: TableEncryption,
    pub teardown: TeardownPolicy,
}

impl TableSpec {
    /// An opaque handle other stacks can use for grants and name
    /// injection. The handle carries the provisioned name by value, so
    /// two handles to the same table compare equal.
    pub fn handle(&self) -> TableHandle {
        TableHandle {
            name: self.name.clone(),
        }
    }
}

/// Reference to a declared table, passable across stack boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableHandle {
    name: String,
}

impl TableHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_carries_the_declared_name() {
        let spec = TableSpec {
            name: "test-ItemsTable".to_string(),
            partition_key: KeyAttribute::string("id"),
            capacity: CapacityMode::OnDemand,
            encryption: TableEncryption::AwsOwned,
            teardown: TeardownPolicy::Destroy,
        };

        let a = spec.handle();
        let b = spec.handle();
        assert_eq!(a, b);
        assert_eq!(a.name(), "test-ItemsTable");
    }
}
