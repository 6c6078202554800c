//! Static pages.

use axum::response::Html;

/// About page.
pub async fn about() -> Html<&'static str> {
    Html(include_str!("../../assets/about.html"))
}

/// Confirmation shown after a successful submission.
pub async fn task_added() -> Html<&'static str> {
    Html(include_str!("../../assets/added.html"))
}

/// Login form; posts credentials to `/auth/login` and returns to `next`.
pub async fn login_page() -> Html<&'static str> {
    Html(include_str!("../../assets/login.html"))
}
