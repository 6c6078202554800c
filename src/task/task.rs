//! The task record.
//!
//! # Invariants
//! - `slug` is unique among all stored tasks
//! - `slug.len() <= SLUG_MAX_LENGTH` and `title.chars().count() <= TITLE_MAX_LENGTH`
//! - a stored task is never modified

use serde::{Deserialize, Serialize};

use super::slug::{slugify, SLUG_MAX_LENGTH};

/// Maximum title length, in characters.
pub const TITLE_MAX_LENGTH: usize = 100;

/// Title used when the submitter leaves it out.
pub const DEFAULT_TITLE: &str = "Значение по-умолчанию";

/// Directory (relative to the media root) where task images live.
pub const IMAGE_UPLOAD_DIR: &str = "tasks";

/// A persisted task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    /// Store-assigned row id; increases with insertion order.
    pub id: i64,
    pub title: String,
    pub text: String,
    pub slug: String,
    /// Reference into the media root, e.g. `tasks/small.gif`.
    pub image: Option<String>,
    /// Creation time (RFC 3339).
    pub created_at: String,
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// A task ready to be inserted: the slug is already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub text: String,
    pub slug: String,
    pub image: Option<String>,
}

impl NewTask {
    /// Build a task from trusted input, deriving the slug from the title
    /// when `slug` is `None` or blank.
    pub fn new(title: impl Into<String>, text: impl Into<String>, slug: Option<&str>) -> Self {
        let title = title.into();
        let slug = resolve_slug(slug, &title);
        Self {
            title,
            text: text.into(),
            slug,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Pick the slug for a new task: the explicit one if present and
/// non-blank, otherwise one derived from `title`.
pub fn resolve_slug(explicit: Option<&str>, title: &str) -> String {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => slug.to_string(),
        None => slugify(title),
    }
}

/// Kind of form input a field renders as.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Char,
    Text,
    Slug,
    Image,
}

/// Presentation metadata for one task field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
    pub help_text: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<&'static str>,
}

/// Field metadata, in form order.
pub const TASK_FIELDS: [FieldSpec; 4] = [
    FieldSpec {
        name: "title",
        kind: FieldKind::Char,
        label: "Заголовок",
        help_text: "Дайте короткое название задаче",
        required: false,
        max_length: Some(TITLE_MAX_LENGTH),
        initial: Some(DEFAULT_TITLE),
    },
    FieldSpec {
        name: "text",
        kind: FieldKind::Text,
        label: "Текст",
        help_text: "Опишите суть задачи",
        required: true,
        max_length: None,
        initial: None,
    },
    FieldSpec {
        name: "slug",
        kind: FieldKind::Slug,
        label: "Адрес для страницы с задачей",
        help_text: "Укажите адрес для страницы задачи. Используйте только латиницу, цифры, дефисы и знаки подчёркивания",
        required: false,
        max_length: Some(SLUG_MAX_LENGTH),
        initial: None,
    },
    FieldSpec {
        name: "image",
        kind: FieldKind::Image,
        label: "Картинка",
        help_text: "Загрузите картинку",
        required: false,
        max_length: None,
        initial: None,
    },
];

/// Look up a field's metadata by name.
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    TASK_FIELDS.iter().find(|f| f.name == name)
}
