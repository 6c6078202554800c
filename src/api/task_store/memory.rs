//! In-memory task store (non-persistent).

use super::{now_string, StoreError, TaskStore};
use crate::task::{NewTask, Task};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        // Uniqueness check and push happen under one write lock.
        let mut tasks = self.tasks.write().await;
        if tasks.iter().any(|t| t.slug == task.slug) {
            return Err(StoreError::DuplicateSlug(task.slug));
        }
        let id = tasks.last().map(|t| t.id + 1).unwrap_or(1);
        let stored = Task {
            id,
            title: task.title,
            text: task.text,
            slug: task.slug,
            image: task.image,
            created_at: now_string(),
        };
        tasks.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.read().await.clone())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Task>, StoreError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .find(|t| t.slug == slug)
            .cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.tasks.read().await.len())
    }
}
