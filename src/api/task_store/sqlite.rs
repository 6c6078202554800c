//! SQLite-based task store.

use super::{now_string, StoreError, TaskStore};
use crate::task::{NewTask, Task};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    text TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    image TEXT,
    created_at TEXT NOT NULL
);
"#;

const TASK_COLUMNS: &str = "id, title, text, slug, image, created_at";

pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    pub async fn new(base_dir: PathBuf) -> Result<Self, StoreError> {
        let db_path = base_dir.join("tasks.db");

        tokio::fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to create data dir: {}", e)))?;

        // Open database in blocking task
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path).map_err(|e| {
                StoreError::Backend(format!("Failed to open SQLite database: {}", e))
            })?;
            conn.execute_batch(SCHEMA)
                .map_err(|e| StoreError::Backend(format!("Failed to run schema: {}", e)))?;
            Ok::<_, StoreError>(conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("Task join error: {}", e)))??;

        tracing::debug!("Opened SQLite task store in {}", base_dir.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("Task join error: {}", e)))?
    }
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        slug: row.get(3)?,
        image: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Whether an insert failed on the `UNIQUE(slug)` constraint.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let created_at = now_string();
        self.with_conn(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO tasks (title, text, slug, image, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![&task.title, &task.text, &task.slug, &task.image, &created_at],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(StoreError::DuplicateSlug(task.slug));
                }
                Err(e) => return Err(backend(e)),
            }

            Ok(Task {
                id: conn.last_insert_rowid(),
                title: task.title,
                text: task.text,
                slug: task.slug,
                image: task.image,
                created_at,
            })
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT {} FROM tasks ORDER BY id ASC", TASK_COLUMNS))
                .map_err(backend)?;
            let tasks = stmt
                .query_map([], row_to_task)
                .map_err(backend)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(backend)?;
            Ok(tasks)
        })
        .await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Task>, StoreError> {
        let slug = slug.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM tasks WHERE slug = ?1", TASK_COLUMNS),
                params![&slug],
                row_to_task,
            )
            .optional()
            .map_err(backend)
        })
        .await
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        let slug = slug.to_string();
        self.with_conn(move |conn| {
            conn.prepare("SELECT 1 FROM tasks WHERE slug = ?1")
                .map_err(backend)?
                .exists(params![&slug])
                .map_err(backend)
        })
        .await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let n: i64 = conn
                .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
                .map_err(backend)?;
            Ok(n as usize)
        })
        .await
    }
}
