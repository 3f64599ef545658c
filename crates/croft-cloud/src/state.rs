//! State management for provisioned stacks
//!
//! Manages the `.croft/state.json` file which records, per stack and in
//! creation order, every resource a provider has provisioned. Teardown
//! walks these records in reverse; the one-shot seed marker also lives
//! here so dependent redeploys never re-trigger it.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use croft_core::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".croft";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";

/// Global state containing all stack states
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Stack states indexed by stack name
    pub stacks: BTreeMap<String, StackState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            stacks: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack(&self, name: &str) -> Option<&StackState> {
        self.stacks.get(name)
    }

    /// Mutable handle to a stack's state, created empty if absent.
    pub fn stack_mut(&mut self, name: &str) -> &mut StackState {
        self.updated_at = Utc::now();
        self.stacks.entry(name.to_string()).or_default()
    }

    pub fn remove_stack(&mut self, name: &str) -> Option<StackState> {
        let removed = self.stacks.remove(name);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Whether the stack has at least one provisioned resource recorded.
    pub fn is_deployed(&self, name: &str) -> bool {
        self.stacks
            .get(name)
            .is_some_and(|s| !s.resources.is_empty())
    }

    /// Finds a record by logical name across all stacks. Logical names
    /// carry the shared prefix, so they are unique app-wide.
    pub fn find_record(&self, logical_name: &str) -> Option<&ResourceRecord> {
        self.stacks.values().find_map(|s| s.get(logical_name))
    }
}

/// Recorded state of one stack, resources in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackState {
    pub resources: Vec<ResourceRecord>,
}

impl StackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record; creation order is teardown order reversed.
    pub fn record(&mut self, record: ResourceRecord) {
        self.resources.push(record);
    }

    pub fn get(&self, logical_name: &str) -> Option<&ResourceRecord> {
        self.resources
            .iter()
            .find(|r| r.logical_name == logical_name)
    }

    pub fn get_mut(&mut self, logical_name: &str) -> Option<&mut ResourceRecord> {
        self.resources
            .iter_mut()
            .find(|r| r.logical_name == logical_name)
    }

    pub fn remove(&mut self, logical_name: &str) -> Option<ResourceRecord> {
        let idx = self
            .resources
            .iter()
            .position(|r| r.logical_name == logical_name)?;
        Some(self.resources.remove(idx))
    }

    pub fn contains(&self, logical_name: &str) -> bool {
        self.get(logical_name).is_some()
    }

    /// Records in reverse creation order, for teardown.
    pub fn reverse_order(&self) -> Vec<ResourceRecord> {
        let mut records = self.resources.clone();
        records.reverse();
        records
    }
}

/// State of a single provisioned resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Logical name from the manifest
    pub logical_name: String,

    /// Resource kind
    pub kind: ResourceKind,

    /// Provider-side identifier (name, id or ARN)
    pub physical_id: String,

    /// Resource attributes (ARNs, domain names, upload digests, ...)
    pub attributes: HashMap<String, serde_json::Value>,

    /// When the resource was created
    pub created_at: DateTime<Utc>,
}

impl ResourceRecord {
    pub fn new(
        logical_name: impl Into<String>,
        kind: ResourceKind,
        physical_id: impl Into<String>,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            kind,
            physical_id: physical_id.into(),
            attributes: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// State manager for reading/writing state files
pub struct StateManager {
    /// Project root directory
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current state
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(GlobalState::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: GlobalState = serde_json::from_str(&content)?;

        // Version check
        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} stacks", state.stacks.len());
        Ok(state)
    }

    /// Save the state
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        // Create backup if state file exists
        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        // Write new state
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} stacks", state.stacks.len());
        Ok(())
    }

    /// Acquire a lock for exclusive access
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();

        // Check for existing lock
        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)?;

            // Check if lock is stale (older than 1 hour)
            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < 1 {
                return Err(CloudError::LockError(format!(
                    "State is locked by {} since {}",
                    lock_info.holder, lock_info.acquired_at
                )));
            }

            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }

        // Create lock
        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!("Acquired state lock");
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

/// Lock information
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for state lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            // Synchronous cleanup in drop - not ideal but necessary
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn state_save_load_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.stack_mut("test-DatabaseStack").record(
            ResourceRecord::new("test-ItemsTable", ResourceKind::Table, "test-ItemsTable")
                .with_attribute("arn", serde_json::json!("arn:aws:dynamodb:::table/test")),
        );

        manager.save(&state).await.unwrap();

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.stacks.len(), 1);
        assert!(loaded.is_deployed("test-DatabaseStack"));
        let record = loaded
            .stack("test-DatabaseStack")
            .and_then(|s| s.get("test-ItemsTable"))
            .unwrap();
        assert_eq!(
            record.get_attribute::<String>("arn").unwrap(),
            "arn:aws:dynamodb:::table/test"
        );
    }

    #[tokio::test]
    async fn empty_state_when_no_file() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = manager.load().await.unwrap();
        assert!(state.stacks.is_empty());
        assert!(!state.is_deployed("test-DatabaseStack"));
    }

    #[tokio::test]
    async fn lock_blocks_second_holder() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let lock = manager.acquire_lock().await.unwrap();
        let second = manager.acquire_lock().await;
        assert!(matches!(second, Err(CloudError::LockError(_))));
        lock.release().await.unwrap();

        // Released lock can be re-acquired.
        let third = manager.acquire_lock().await.unwrap();
        third.release().await.unwrap();
    }

    #[test]
    fn reverse_order_flips_creation_order() {
        let mut stack = StackState::new();
        stack.record(ResourceRecord::new("a", ResourceKind::Table, "a"));
        stack.record(ResourceRecord::new("b", ResourceKind::Function, "b"));

        let reversed: Vec<_> = stack
            .reverse_order()
            .into_iter()
            .map(|r| r.logical_name)
            .collect();
        assert_eq!(reversed, vec!["b", "a"]);
    }
}
