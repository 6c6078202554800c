//! Task module - the task record, slug derivation, submission and reads.
//!
//! - `slug`: pure title-to-slug derivation
//! - `task`: the record type and its field metadata
//! - `submission`: validation and the guarded create path
//! - `reader`: list/detail reads behind an explicit access decision

pub mod reader;
pub mod slug;
pub mod submission;
#[allow(clippy::module_inception)]
pub mod task;

pub use reader::{list_tasks, task_detail, Access, ReadError};
pub use slug::{is_valid_slug, slugify, SLUG_MAX_LENGTH};
pub use submission::{
    create_task, duplicate_slug_message, FieldErrors, ImageUpload, SubmissionError,
    SubmissionHandler, TaskForm,
};
pub use task::{
    field, resolve_slug, FieldKind, FieldSpec, NewTask, Task, DEFAULT_TITLE, IMAGE_UPLOAD_DIR,
    TASK_FIELDS, TITLE_MAX_LENGTH,
};
