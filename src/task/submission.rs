//! Task submission: form cleaning, slug resolution and the guarded insert.
//!
//! Creation is two explicit steps: resolve the slug (explicit or derived),
//! then insert. The store's own uniqueness constraint is authoritative; a
//! violation it reports is turned into the same field error as the
//! pre-check, so both paths surface identically to the submitter.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::slug::{is_valid_slug, slugify, SLUG_MAX_LENGTH};
use super::task::{NewTask, Task, DEFAULT_TITLE, TITLE_MAX_LENGTH};
use crate::api::task_store::{StoreError, TaskStore};
use crate::media::{AssetError, AssetStore};

pub const REQUIRED_MESSAGE: &str = "Обязательное поле.";
pub const INVALID_SLUG_MESSAGE: &str =
    "Значение должно состоять только из латинских букв, цифр, знаков подчеркивания или дефиса.";
pub const UNDERIVABLE_SLUG_MESSAGE: &str =
    "Не удалось построить адрес из заголовка, укажите его вручную";

/// Message shown when a slug is already taken.
pub fn duplicate_slug_message(slug: &str) -> String {
    format!(
        "Адрес \"{}\" уже существует, придумайте уникальное значение",
        slug
    )
}

fn max_length_message(limit: usize, actual: usize) -> String {
    format!(
        "Убедитесь, что это значение содержит не более {} символов (сейчас {}).",
        limit, actual
    )
}

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for one field (empty if the field is valid).
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// An uploaded image, fully read.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Raw values of the submission form, as received.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskForm {
    pub title: Option<String>,
    pub text: Option<String>,
    pub slug: Option<String>,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

/// Form values after per-field cleaning.
///
/// `slug` is `None` when it could not be resolved (invalid explicit value,
/// invalid title, or a title that derives to nothing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedForm {
    pub title: String,
    pub text: String,
    pub slug: Option<String>,
}

impl TaskForm {
    /// Clean every field, collecting all field errors at once.
    pub fn clean(&self) -> (CleanedForm, FieldErrors) {
        let mut errors = FieldErrors::new();

        let title = match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => DEFAULT_TITLE.to_string(),
        };
        let title_len = title.chars().count();
        let title_ok = title_len <= TITLE_MAX_LENGTH;
        if !title_ok {
            errors.add("title", max_length_message(TITLE_MAX_LENGTH, title_len));
        }

        let text = self
            .text
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if text.is_empty() {
            errors.add("text", REQUIRED_MESSAGE);
        }

        let explicit = self
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let slug = match explicit {
            Some(slug) => {
                let mut ok = true;
                let len = slug.chars().count();
                if len > SLUG_MAX_LENGTH {
                    errors.add("slug", max_length_message(SLUG_MAX_LENGTH, len));
                    ok = false;
                }
                if !is_valid_slug(slug) {
                    errors.add("slug", INVALID_SLUG_MESSAGE);
                    ok = false;
                }
                ok.then(|| slug.to_string())
            }
            None if title_ok => {
                let derived = slugify(&title);
                if derived.is_empty() {
                    errors.add("slug", UNDERIVABLE_SLUG_MESSAGE);
                    None
                } else {
                    Some(derived)
                }
            }
            None => None,
        };

        (CleanedForm { title, text, slug }, errors)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// The form is invalid; nothing was written.
    #[error("submission rejected: {0:?}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

impl From<StoreError> for SubmissionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateSlug(slug) => {
                Self::Validation(FieldErrors::single("slug", duplicate_slug_message(&slug)))
            }
            other => Self::Store(other),
        }
    }
}

/// Insert an already-resolved task.
///
/// This is the single creation path: a duplicate slug reported by the
/// store becomes `SubmissionError::Validation`.
pub async fn create_task(store: &dyn TaskStore, task: NewTask) -> Result<Task, SubmissionError> {
    Ok(store.insert(task).await?)
}

/// Orchestrates validation, the slug pre-check, image storage and insert.
#[derive(Clone)]
pub struct SubmissionHandler {
    store: Arc<dyn TaskStore>,
    assets: Arc<dyn AssetStore>,
}

impl SubmissionHandler {
    pub fn new(store: Arc<dyn TaskStore>, assets: Arc<dyn AssetStore>) -> Self {
        Self { store, assets }
    }

    /// Validate and persist a submitted form.
    ///
    /// On success exactly one task is written. On any error no task is
    /// written and no image is left behind.
    pub async fn submit(&self, form: TaskForm) -> Result<Task, SubmissionError> {
        let (cleaned, mut errors) = form.clean();

        if let Some(slug) = cleaned.slug.as_deref() {
            if self.store.slug_exists(slug).await? {
                errors.add("slug", duplicate_slug_message(slug));
            }
        }
        if !errors.is_empty() {
            tracing::info!("Rejected task submission: {:?}", errors);
            return Err(SubmissionError::Validation(errors));
        }
        let Some(slug) = cleaned.slug else {
            return Err(SubmissionError::Validation(errors));
        };

        let image = match &form.image {
            Some(upload) => Some(self.assets.save(&upload.file_name, &upload.bytes).await?),
            None => None,
        };

        let new_task = NewTask {
            title: cleaned.title,
            text: cleaned.text,
            slug,
            image: image.clone(),
        };

        match create_task(self.store.as_ref(), new_task).await {
            Ok(task) => {
                tracing::info!("Created task {} (slug {})", task.id, task.slug);
                Ok(task)
            }
            Err(e) => {
                if let Some(reference) = image {
                    if let Err(remove_err) = self.assets.remove(&reference).await {
                        tracing::warn!("Failed to remove orphaned image {}: {}", reference, remove_err);
                    }
                }
                match &e {
                    SubmissionError::Validation(errors) => {
                        tracing::info!("Slug taken at insert time: {:?}", errors)
                    }
                    other => tracing::error!("Failed to store task: {}", other),
                }
                Err(e)
            }
        }
    }
}
