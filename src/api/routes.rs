//! HTTP routing and server lifecycle.

use std::sync::Arc;

use axum::middleware;
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::media::{AssetStore, FsAssetStore};
use crate::task::SubmissionHandler;

use super::auth;
use super::pages;
use super::task_store::{create_task_store, TaskStore};
use super::tasks;
use super::types::HealthResponse;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Task persistence
    pub store: Arc<dyn TaskStore>,
    /// The create path (validation, pre-check, image, insert)
    pub submissions: SubmissionHandler,
}

impl AppState {
    /// Open the configured stores.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = create_task_store(config.task_store, config.data_dir.clone()).await?;
        tracing::info!(
            "Task store ready ({:?}, persistent: {})",
            config.task_store,
            store.is_persistent()
        );

        let assets: Arc<dyn AssetStore> = Arc::new(FsAssetStore::new(config.media_root.clone()));
        let submissions = SubmissionHandler::new(Arc::clone(&store), assets);

        Ok(Self {
            config,
            store,
            submissions,
        })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let form_routes = Router::new()
        .route("/", get(tasks::form_schema).post(tasks::create_task))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    Router::new()
        .merge(form_routes)
        .route("/tasks/added", get(pages::task_added))
        .route("/tasks/:slug", get(tasks::get_task))
        .route("/page/about", get(pages::about))
        .route(auth::LOGIN_PATH, get(pages::login_page).post(auth::login))
        .route("/health", get(health))
        .nest_service("/media", ServeDir::new(&state.config.media_root))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::attach_access,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config).await?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dev_mode: state.config.dev_mode,
        auth_required: state.config.auth.auth_required(state.config.dev_mode),
        persistent_store: state.store.is_persistent(),
    })
}
