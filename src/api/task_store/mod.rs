//! Task storage module with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database
//!
//! Every backend enforces slug uniqueness itself at insert time and reports
//! a violation as [`StoreError::DuplicateSlug`], independently of any
//! pre-check done by the caller.

mod memory;
mod sqlite;

pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use crate::task::{NewTask, Task};

/// Errors returned by task stores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The slug is already taken by another task.
    #[error("slug \"{0}\" already exists")]
    DuplicateSlug(String),

    /// The backend failed (I/O, SQL, join error).
    #[error("task store failure: {0}")]
    Backend(String),
}

/// Get current timestamp as RFC3339 string.
pub fn now_string() -> String {
    Utc::now().to_rfc3339()
}

/// Task store trait - implemented by all storage backends.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Insert a new task, failing with `DuplicateSlug` if the slug is taken.
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError>;

    /// All tasks in insertion order.
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    /// A single task by slug.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Task>, StoreError>;

    /// Whether a task with this slug exists.
    async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }

    /// Number of stored tasks.
    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list().await?.len())
    }
}

/// Task store type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStoreType {
    Memory,
    #[default]
    Sqlite,
}

impl TaskStoreType {
    /// Parse from environment variable value.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" => Self::Memory,
            "sqlite" | "db" => Self::Sqlite,
            _ => Self::default(),
        }
    }
}

/// Create a task store based on type and configuration.
pub async fn create_task_store(
    store_type: TaskStoreType,
    base_dir: PathBuf,
) -> Result<Arc<dyn TaskStore>, StoreError> {
    match store_type {
        TaskStoreType::Memory => Ok(Arc::new(InMemoryTaskStore::new())),
        TaskStoreType::Sqlite => {
            let store = SqliteTaskStore::new(base_dir).await?;
            Ok(Arc::new(store))
        }
    }
}
