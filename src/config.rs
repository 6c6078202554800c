//! Configuration management for taskboard.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `DATA_DIR` - Optional. Directory for the task database. Defaults to `./data`.
//! - `MEDIA_ROOT` - Optional. Directory for uploaded images. Defaults to `./media`.
//! - `TASK_STORE` - Optional. `sqlite` (default) or `memory`.
//! - `MAX_UPLOAD_BYTES` - Optional. Body limit for the submission form. Defaults to 10 MiB.
//! - `DEV_MODE` - Optional. When true, task reads are not gated. Defaults to `false`.
//! - `JWT_SECRET` - Required unless `DEV_MODE`. Secret for session tokens.
//! - `JWT_TTL_DAYS` - Optional. Session token lifetime. Defaults to `30`.
//! - `AUTH_USERNAME` - Optional. Operator account name. Defaults to `admin`.
//! - `AUTH_PASSWORD` - Optional. Operator password; login is refused while unset.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::task_store::TaskStoreType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Operator authentication settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Operator account name
    pub username: String,

    /// Operator password (login disabled when unset)
    pub password: Option<String>,

    /// HMAC secret for session tokens
    pub jwt_secret: Option<String>,

    /// Session token lifetime in days
    pub jwt_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: None,
            jwt_secret: None,
            jwt_ttl_days: 30,
        }
    }
}

impl AuthConfig {
    /// Whether reads must present a valid session.
    pub fn auth_required(&self, dev_mode: bool) -> bool {
        !dev_mode
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Directory holding the task database
    pub data_dir: PathBuf,

    /// Directory holding uploaded images
    pub media_root: PathBuf,

    /// Task storage backend
    pub task_store: TaskStoreType,

    /// Request body limit for the submission form
    pub max_upload_bytes: usize,

    /// Disable the read gate
    pub dev_mode: bool,

    /// Operator authentication
    pub auth: AuthConfig,
}

fn parse_env<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(name.to_string(), other.to_string())),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for unparsable values and
    /// `ConfigError::MissingEnvVar` if `JWT_SECRET` is unset outside dev mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_env("PORT", "3000")?;

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let media_root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));

        let task_store = TaskStoreType::from_str(
            &std::env::var("TASK_STORE").unwrap_or_else(|_| "sqlite".to_string()),
        );
        let max_upload_bytes = parse_env("MAX_UPLOAD_BYTES", "10485760")?;

        let dev_mode = match std::env::var("DEV_MODE") {
            Ok(v) => parse_bool("DEV_MODE", &v)?,
            Err(_) => false,
        };

        let auth = AuthConfig {
            username: non_empty_env("AUTH_USERNAME").unwrap_or_else(|| "admin".to_string()),
            password: non_empty_env("AUTH_PASSWORD"),
            jwt_secret: non_empty_env("JWT_SECRET"),
            jwt_ttl_days: parse_env("JWT_TTL_DAYS", "30")?,
        };

        if auth.auth_required(dev_mode) && auth.jwt_secret.is_none() {
            return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()));
        }

        Ok(Self {
            host,
            port,
            data_dir,
            media_root,
            task_store,
            max_upload_bytes,
            dev_mode,
            auth,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(data_dir: PathBuf, media_root: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data_dir,
            media_root,
            task_store: TaskStoreType::Memory,
            max_upload_bytes: 10 * 1024 * 1024,
            dev_mode: false,
            auth: AuthConfig::default(),
        }
    }
}
