//! # Taskboard
//!
//! A small task bulletin board.
//!
//! Anyone can submit a task (title, text, optional slug and image) through
//! a public form. Only signed-in operators can browse the list of tasks or
//! open a single task by its slug.
//!
//! ## Submission Flow
//! 1. Clean the form fields and resolve the slug (explicit or derived from the title)
//! 2. Reject the form if the slug is already taken
//! 3. Store the image, then insert the task
//! 4. A uniqueness violation at insert time is reported like the pre-check
//!
//! ## Modules
//! - `api`: HTTP routes, auth and task persistence
//! - `task`: The task record, slug derivation, submission and reads
//! - `media`: Uploaded image storage
//! - `config`: Environment-driven configuration

pub mod api;
pub mod config;
pub mod media;
pub mod task;

pub use config::Config;
pub use task::{slugify, Task};
