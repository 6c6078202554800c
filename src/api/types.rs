//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::task::{FieldErrors, FieldSpec, Task, TaskForm};

/// The submission form: field metadata plus any echoed values and errors.
#[derive(Debug, Clone, Serialize)]
pub struct FormResponse {
    /// Field metadata in form order
    pub fields: Vec<FieldSpec>,

    /// Values as submitted (absent on a fresh form)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<TaskForm>,

    /// Per-field validation messages
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
}

/// All tasks.
#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    pub count: usize,
    pub tasks: Vec<Task>,
}

/// One task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetailResponse {
    pub task: Task,

    /// Public URL of the task image, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Whether the server is running in dev mode (read gate disabled)
    pub dev_mode: bool,

    /// Whether task reads require a session
    pub auth_required: bool,

    /// Whether tasks survive a restart
    pub persistent_store: bool,
}

/// Login request for operator auth.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    pub password: String,
}

/// Login response containing a JWT for API authentication.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Expiration as unix seconds.
    pub exp: i64,
}
