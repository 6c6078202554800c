//! Task endpoints: the submission form, the gated list and detail views.

use std::sync::Arc;

use axum::{
    extract::{Multipart, OriginalUri, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};

use super::auth::login_redirect;
use super::routes::AppState;
use super::types::{FormResponse, TaskDetailResponse, TaskListResponse};
use crate::task::{
    self, Access, FieldErrors, ImageUpload, ReadError, SubmissionError, TaskForm, TASK_FIELDS,
};

/// Where a successful submission lands.
pub const TASK_ADDED_PATH: &str = "/tasks/added";

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Empty submission form.
pub async fn form_schema() -> Json<FormResponse> {
    Json(FormResponse {
        fields: TASK_FIELDS.to_vec(),
        form: None,
        errors: FieldErrors::new(),
    })
}

/// Read the multipart submission into a form.
///
/// An `image` part without a file name or content counts as no image.
async fn read_form(mut multipart: Multipart) -> Result<TaskForm, (StatusCode, String)> {
    let mut form = TaskForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
                if let Some(file_name) = file_name.filter(|n| !n.is_empty()) {
                    if !bytes.is_empty() {
                        form.image = Some(ImageUpload {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
            }
            "title" | "text" | "slug" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
                match name.as_str() {
                    "title" => form.title = Some(value),
                    "text" => form.text = Some(value),
                    _ => form.slug = Some(value),
                }
            }
            other => tracing::debug!("Ignoring unknown form field {}", other),
        }
    }
    Ok(form)
}

/// Submit a new task.
///
/// Success redirects to the confirmation page. A rejected form is returned
/// with status 200 along with the submitted values and per-field errors.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let form = read_form(multipart).await?;
    let echo = TaskForm {
        title: form.title.clone(),
        text: form.text.clone(),
        slug: form.slug.clone(),
        image: None,
    };

    match state.submissions.submit(form).await {
        Ok(_) => Ok(Redirect::to(TASK_ADDED_PATH).into_response()),
        Err(SubmissionError::Validation(errors)) => Ok((
            StatusCode::OK,
            Json(FormResponse {
                fields: TASK_FIELDS.to_vec(),
                form: Some(echo),
                errors,
            }),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Task submission failed: {}", e);
            Err(internal_error(e))
        }
    }
}

fn read_error_response(e: ReadError, uri: &OriginalUri) -> Result<Response, (StatusCode, String)> {
    match e {
        ReadError::AuthRequired => Ok(login_redirect(uri.0.path())),
        ReadError::NotFound(slug) => Err((
            StatusCode::NOT_FOUND,
            format!("Task {} not found", slug),
        )),
        ReadError::Store(e) => {
            tracing::error!("Task read failed: {}", e);
            Err(internal_error(e))
        }
    }
}

/// List all tasks.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(access): Extension<Access>,
    uri: OriginalUri,
) -> Result<Response, (StatusCode, String)> {
    match task::list_tasks(state.store.as_ref(), &access).await {
        Ok(tasks) => Ok(Json(TaskListResponse {
            count: tasks.len(),
            tasks,
        })
        .into_response()),
        Err(e) => read_error_response(e, &uri),
    }
}

/// Show one task.
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Extension(access): Extension<Access>,
    uri: OriginalUri,
    Path(slug): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    match task::task_detail(state.store.as_ref(), &access, &slug).await {
        Ok(task) => {
            let image_url = task.image.as_ref().map(|image| format!("/media/{}", image));
            Ok(Json(TaskDetailResponse { task, image_url }).into_response())
        }
        Err(e) => read_error_response(e, &uri),
    }
}

#[cfg(test)]
mod tests {
    use super::super::routes::{router, AppState};
    use crate::config::Config;
    use crate::task::{create_task, NewTask};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "taskboard-test-boundary";

    const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x01\x00\x01\x00\x00\x00\x00\x21\xf9\x04\
\x01\x0a\x00\x01\x00\x2c\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02\x4c\x01\x00\x3b";

    struct Harness {
        state: Arc<AppState>,
        app: Router,
        media: TempDir,
        _data: TempDir,
    }

    async fn harness() -> Harness {
        let data = TempDir::new().unwrap();
        let media = TempDir::new().unwrap();
        let mut config = Config::new(data.path().to_path_buf(), media.path().to_path_buf());
        config.auth.jwt_secret = Some("test-secret".to_string());
        config.auth.password = Some("hunter2".to_string());
        let state = Arc::new(AppState::new(config).await.unwrap());
        create_task(
            state.store.as_ref(),
            NewTask::new("Заголовок", "Текст", Some("test-slug")),
        )
        .await
        .unwrap();
        let app = router(Arc::clone(&state));
        Harness {
            state,
            app,
            media,
            _data: data,
        }
    }

    fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: image/gif\r\n\r\n",
                    BOUNDARY, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn post_form(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"admin","password":"hunter2"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_some());
        json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_task_with_image_redirects_to_added() {
        let h = harness().await;
        let before = h.state.store.count().await.unwrap();

        let body = multipart_body(
            &[("title", "Тестовый заголовок"), ("text", "Тестовый текст")],
            Some(("small.gif", SMALL_GIF)),
        );
        let response = h.app.clone().oneshot(post_form("/tasks", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/tasks/added"
        );
        assert_eq!(h.state.store.count().await.unwrap(), before + 1);

        let task = h
            .state
            .store
            .get_by_slug("testovyij-zagolovok")
            .await
            .unwrap()
            .expect("task should be stored under its derived slug");
        assert_eq!(task.text, "Тестовый текст");
        assert_eq!(task.image.as_deref(), Some("tasks/small.gif"));
        assert!(h.media.path().join("tasks/small.gif").exists());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rerenders_form_with_200() {
        let h = harness().await;
        let before = h.state.store.count().await.unwrap();

        let body = multipart_body(
            &[
                ("title", "Заголовок из формы"),
                ("text", "Текст из формы"),
                ("slug", "test-slug"),
            ],
            None,
        );
        let response = h.app.clone().oneshot(post_form("/", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let value = json(response).await;
        assert_eq!(
            value["errors"]["slug"][0],
            "Адрес \"test-slug\" уже существует, придумайте уникальное значение"
        );
        assert_eq!(value["form"]["title"], "Заголовок из формы");
        assert_eq!(h.state.store.count().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_expanding_title_then_explicit_duplicate() {
        let h = harness().await;
        let title = "Ж".repeat(100);

        let body = multipart_body(&[("title", &title), ("text", "sample text")], None);
        let response = h.app.clone().oneshot(post_form("/tasks", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let slug = "zh".repeat(50);
        assert!(h.state.store.slug_exists(&slug).await.unwrap());

        let body = multipart_body(
            &[("title", "другой"), ("text", "sample text"), ("slug", &slug)],
            None,
        );
        let response = h.app.clone().oneshot(post_form("/tasks", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = json(response).await;
        assert_eq!(
            value["errors"]["slug"][0],
            format!("Адрес \"{}\" уже существует, придумайте уникальное значение", slug)
        );
    }

    #[tokio::test]
    async fn test_form_schema_shows_initial_title() {
        let h = harness().await;
        let response = h.app.clone().oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = json(response).await;
        let fields = value["fields"].as_array().unwrap();
        let kinds: Vec<_> = fields.iter().map(|f| f["kind"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["char", "text", "slug", "image"]);
        assert_eq!(fields[0]["initial"], "Значение по-умолчанию");
        assert_eq!(fields[0]["label"], "Заголовок");
    }

    #[tokio::test]
    async fn test_anonymous_reads_redirect_to_login() {
        let h = harness().await;
        for (uri, location) in [
            ("/tasks", "/auth/login?next=/tasks"),
            ("/tasks/test-slug", "/auth/login?next=/tasks/test-slug"),
        ] {
            let response = h.app.clone().oneshot(get(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers().get(header::LOCATION).unwrap(), location);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(!String::from_utf8_lossy(&bytes).contains("Заголовок"));
        }
    }

    #[tokio::test]
    async fn test_authenticated_list_and_detail() {
        let h = harness().await;
        let token = login(&h.app).await;

        let response = h.app.clone().oneshot(get("/tasks", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = json(response).await;
        assert_eq!(value["count"], 1);
        assert_eq!(value["tasks"][0]["title"], "Заголовок");
        assert_eq!(value["tasks"][0]["text"], "Текст");
        assert_eq!(value["tasks"][0]["slug"], "test-slug");

        let response = h
            .app
            .clone()
            .oneshot(get("/tasks/test-slug", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = json(response).await;
        assert_eq!(value["task"]["title"], "Заголовок");
        assert_eq!(value["task"]["slug"], "test-slug");
    }

    #[tokio::test]
    async fn test_session_cookie_grants_access() {
        let h = harness().await;
        let token = login(&h.app).await;
        let request = Request::builder()
            .uri("/tasks")
            .header(header::COOKIE, format!("taskboard_session={}", token))
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_task_is_not_found() {
        let h = harness().await;
        let token = login(&h.app).await;
        let response = h
            .app
            .clone()
            .oneshot(get("/tasks/no-such-task", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let h = harness().await;
        let response = h
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"password":"wrong"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_pages() {
        let h = harness().await;
        for uri in ["/tasks/added", "/page/about", "/auth/login", "/health"] {
            let response = h.app.clone().oneshot(get(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }
}
