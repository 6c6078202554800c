//! Minimal JWT auth for the operator (single-tenant).
//!
//! - The login page submits credentials to `POST /auth/login`
//! - Server returns a JWT valid for ~30 days and sets it as an HTTP-only cookie
//! - Every request is resolved to an [`Access`] value before handlers run;
//!   task reads refuse `Access::Anonymous`
//!
//! Tokens are accepted from `Authorization: Bearer <jwt>` or the
//! `taskboard_session` cookie.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

use super::routes::AppState;
use super::types::{LoginRequest, LoginResponse};
use crate::config::Config;
use crate::task::Access;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "taskboard_session";

/// Path of the login entry point.
pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    /// Subject (operator username)
    sub: String,
    /// Issued-at unix seconds
    iat: i64,
    /// Expiration unix seconds
    exp: i64,
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    if a_bytes.len() != b_bytes.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for i in 0..a_bytes.len() {
        diff |= a_bytes[i] ^ b_bytes[i];
    }
    diff == 0
}

fn issue_jwt(secret: &str, username: &str, ttl_days: i64) -> anyhow::Result<(String, i64)> {
    let now = Utc::now();
    let exp = now + Duration::days(ttl_days.max(1));
    let claims = Claims {
        sub: username.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, claims.exp))
}

fn verify_jwt(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let validation = Validation::default();
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

/// Pull the session token from the Authorization header or session cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Decide who is calling. Never fails: anything short of a valid token is
/// `Access::Anonymous`.
pub fn resolve_access(headers: &HeaderMap, config: &Config) -> Access {
    if !config.auth.auth_required(config.dev_mode) {
        return Access::authenticated(config.auth.username.clone());
    }
    let Some(secret) = config.auth.jwt_secret.as_deref() else {
        return Access::Anonymous;
    };
    match extract_token(headers) {
        Some(token) => match verify_jwt(&token, secret) {
            Ok(claims) => Access::authenticated(claims.sub),
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                Access::Anonymous
            }
        },
        None => Access::Anonymous,
    }
}

/// Middleware that attaches the caller's [`Access`] to the request.
pub async fn attach_access(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let access = resolve_access(req.headers(), &state.config);
    req.extensions_mut().insert(access);
    next.run(req).await
}

/// Redirect to the login page, remembering where the caller was going.
pub fn login_redirect(next: &str) -> Response {
    // Slashes stay readable in the query, as in `?next=/tasks/abc`.
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    Redirect::to(&format!("{}?next={}", LOGIN_PATH, encoded)).into_response()
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, (StatusCode, String)> {
    let auth = &state.config.auth;
    let expected = auth.password.as_deref().unwrap_or("");
    let username = req
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(auth.username.as_str());

    if expected.is_empty()
        || !constant_time_eq(username, &auth.username)
        || !constant_time_eq(req.password.trim(), expected)
    {
        tracing::info!("Failed login attempt for {}", username);
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()));
    }

    let secret = auth.jwt_secret.as_deref().ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "JWT_SECRET not configured".to_string(),
        )
    })?;

    let (token, exp) = issue_jwt(secret, username, auth.jwt_ttl_days)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let max_age = (exp - Utc::now().timestamp()).max(0);
    let cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    tracing::info!("Operator {} logged in", username);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse { token, exp }),
    )
        .into_response())
}
