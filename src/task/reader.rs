//! Gated read access to stored tasks.
//!
//! The caller's identity is computed before these functions run and passed
//! in as an [`Access`] value; anonymous callers never receive task data.

use crate::api::task_store::{StoreError, TaskStore};

use super::task::Task;

/// Outcome of the authentication gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Authenticated { username: String },
    Anonymous,
}

impl Access {
    pub fn authenticated(username: impl Into<String>) -> Self {
        Self::Authenticated {
            username: username.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("authentication required")]
    AuthRequired,

    #[error("task \"{0}\" not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn ensure_authenticated(access: &Access) -> Result<(), ReadError> {
    if access.is_authenticated() {
        Ok(())
    } else {
        Err(ReadError::AuthRequired)
    }
}

/// All tasks, in insertion order.
pub async fn list_tasks(store: &dyn TaskStore, access: &Access) -> Result<Vec<Task>, ReadError> {
    ensure_authenticated(access)?;
    Ok(store.list().await?)
}

/// One task by slug.
pub async fn task_detail(
    store: &dyn TaskStore,
    access: &Access,
    slug: &str,
) -> Result<Task, ReadError> {
    ensure_authenticated(access)?;
    store
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| ReadError::NotFound(slug.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::task_store::InMemoryTaskStore;
    use crate::task::NewTask;

    async fn seeded() -> InMemoryTaskStore {
        let store = InMemoryTaskStore::new();
        store
            .insert(NewTask::new("Заголовок", "Текст", Some("test-slug")))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_list_requires_authentication() {
        let store = seeded().await;
        let result = list_tasks(&store, &Access::Anonymous).await;
        assert!(matches!(result, Err(ReadError::AuthRequired)));
    }

    #[tokio::test]
    async fn test_list_returns_all_tasks() {
        let store = seeded().await;
        let tasks = list_tasks(&store, &Access::authenticated("admin")).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Заголовок");
        assert_eq!(tasks[0].text, "Текст");
        assert_eq!(tasks[0].slug, "test-slug");
    }

    #[tokio::test]
    async fn test_detail_requires_authentication() {
        let store = seeded().await;
        let result = task_detail(&store, &Access::Anonymous, "test-slug").await;
        assert!(matches!(result, Err(ReadError::AuthRequired)));
    }

    #[tokio::test]
    async fn test_detail_found_and_not_found() {
        let store = seeded().await;
        let access = Access::authenticated("admin");

        let task = task_detail(&store, &access, "test-slug").await.unwrap();
        assert_eq!(task.title, "Заголовок");

        let missing = task_detail(&store, &access, "nope").await;
        assert!(matches!(missing, Err(ReadError::NotFound(slug)) if slug == "nope"));
    }
}
