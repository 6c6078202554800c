//! HTTP API for the task board.
//!
//! ## Endpoints
//!
//! - `GET /` - Empty submission form (field metadata)
//! - `POST /` - Submit a task (alias of `POST /tasks`)
//! - `POST /tasks` - Submit a task (multipart: `title`, `text`, `slug`, `image`)
//! - `GET /tasks` - List tasks (session required)
//! - `GET /tasks/added` - Submission confirmation page
//! - `GET /tasks/{slug}` - Show one task (session required)
//! - `GET /page/about` - About page
//! - `GET /auth/login` - Login page
//! - `POST /auth/login` - Exchange credentials for a session token
//! - `GET /media/{path}` - Uploaded images
//! - `GET /health` - Health check

pub mod auth;
mod pages;
mod routes;
pub mod task_store;
mod tasks;
pub mod types;

pub use routes::{router, serve, AppState};
pub use types::*;
