//! Resource naming convention
//!
//! Every declared resource is named `${prefix}-<Role>`. The prefix is the
//! single configuration value shared by all stacks, so it is validated
//! once and reused everywhere.

use crate::error::{CoreError, Result};

/// Longest prefix that still leaves room for the role suffix within the
/// tightest provider limit (S3 bucket names, 63 characters).
const MAX_PREFIX_LEN: usize = 32;

/// Builds the canonical `${prefix}-<Role>` resource name.
pub fn resource_name(prefix: &str, role: &str) -> String {
    format!("{prefix}-{role}")
}

/// Bucket names must be lowercase; the logical name keeps the shared
/// convention, this derives the physical one.
pub fn bucket_physical_name(prefix: &str, role: &str) -> String {
    resource_name(prefix, role).to_lowercase()
}

/// Validates a naming prefix against the strictest downstream rules.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    let err = |reason: &str| {
        Err(CoreError::InvalidPrefix(
            prefix.to_string(),
            reason.to_string(),
        ))
    };

    if prefix.is_empty() {
        return err("must not be empty");
    }
    if prefix.len() > MAX_PREFIX_LEN {
        return err("must be at most 32 characters");
    }
    if !prefix.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return err("must start with a letter or digit");
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return err("may only contain letters, digits and '-'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_name_joins_prefix_and_role() {
        assert_eq!(resource_name("test", "ItemsTable"), "test-ItemsTable");
    }

    #[test]
    fn bucket_name_is_lowercased() {
        assert_eq!(
            bucket_physical_name("Test", "FrontendBucket"),
            "test-frontendbucket"
        );
    }

    #[test]
    fn prefix_validation() {
        assert!(validate_prefix("test").is_ok());
        assert!(validate_prefix("salad-app2").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("-leading").is_err());
        assert!(validate_prefix("no_underscores").is_err());
        assert!(validate_prefix(&"x".repeat(40)).is_err());
    }
}
