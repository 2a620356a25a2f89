//! # Authentication and Authorization
//!
//! Admin routes accept either the `beacon_admin` session cookie issued by the
//! password login, or an `Authorization: Bearer <token>` header matching one of
//! the configured admin API tokens. All comparisons are constant time.
//!
//! A session cookie is `<issued_at>.<digest>`, where the digest is an
//! HMAC-SHA256 over the issue time keyed by the admin password. Sessions
//! older than `admin_session_max_age_seconds` are refused server side.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{
        HeaderMap,
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};
use crate::server::AppState;

/// Name of the admin session cookie
pub const ADMIN_COOKIE_NAME: &str = "beacon_admin";

const SESSION_MESSAGE: &[u8] = b"admin-session";

type HmacSha256 = Hmac<Sha256>;

/// Marker type for authenticated admin requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminAuth;

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Authentication middleware guarding admin routes
pub async fn admin_auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&config, request.headers())?;
    request.extensions_mut().insert(AdminAuth);
    Ok(next.run(request).await)
}

fn authorize(config: &AppConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    if let Some(header) = headers.get(AUTHORIZATION) {
        let header = header
            .to_str()
            .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))?;

        return if validate_api_token(config, token) {
            tracing::debug!("Authenticated admin request via API token");
            Ok(())
        } else {
            Err(unauthorized(Some("Invalid bearer token")))
        };
    }

    match cookie_value(headers, ADMIN_COOKIE_NAME) {
        Some(value) if validate_session_cookie(config, &value, Utc::now().timestamp()) => Ok(()),
        Some(_) => Err(unauthorized(Some("Admin session is invalid"))),
        None => Err(unauthorized(Some("Admin authentication required"))),
    }
}

fn validate_api_token(config: &AppConfig, token: &str) -> bool {
    config
        .admin_api_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into())
}

fn validate_session_cookie(config: &AppConfig, value: &str, now: i64) -> bool {
    let Some(password) = admin_password(config) else {
        return false;
    };
    let Some(issued_at) = value
        .split_once('.')
        .and_then(|(issued_at, _)| issued_at.parse::<i64>().ok())
    else {
        return false;
    };

    let age = now.saturating_sub(issued_at);
    let max_age = i64::try_from(config.admin_session_max_age_seconds).unwrap_or(i64::MAX);
    if !(0..=max_age).contains(&age) {
        tracing::debug!(issued_at, age, "Rejected expired admin session");
        return false;
    }

    let Some(expected) = session_token(password, issued_at) else {
        return false;
    };
    ConstantTimeEq::ct_eq(value.as_bytes(), expected.as_bytes()).into()
}

fn admin_password(config: &AppConfig) -> Option<&str> {
    config.admin_password.as_deref().filter(|p| !p.is_empty())
}

/// Session value for a login at `issued_at` (Unix seconds): the timestamp
/// and a hex HMAC-SHA256 over it keyed by the admin password. The cookie
/// carries this digest, never the password.
pub fn session_token(password: &str, issued_at: i64) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(password.as_bytes()).ok()?;
    mac.update(SESSION_MESSAGE);
    mac.update(b":");
    mac.update(issued_at.to_string().as_bytes());
    Some(format!("{}.{}", issued_at, hex::encode(mac.finalize().into_bytes())))
}

/// Constant time comparison of a login attempt against the configured password.
/// Always false when no password is configured.
pub fn verify_password(config: &AppConfig, candidate: &str) -> bool {
    match admin_password(config) {
        Some(password) => ConstantTimeEq::ct_eq(candidate.as_bytes(), password.as_bytes()).into(),
        None => false,
    }
}

/// `Set-Cookie` value establishing an admin session
pub fn session_cookie(config: &AppConfig, token: &str) -> String {
    cookie_header(config, token, config.admin_session_max_age_seconds)
}

/// `Set-Cookie` value that expires the admin session immediately
pub fn clear_session_cookie(config: &AppConfig) -> String {
    cookie_header(config, "", 0)
}

fn cookie_header(config: &AppConfig, value: &str, max_age: u64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ADMIN_COOKIE_NAME, value, max_age
    );
    if !config.is_development() {
        cookie.push_str("; Secure");
    }
    cookie
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}

impl<S> FromRequestParts<S> for AdminAuth
where
    Arc<AppConfig>: FromRef<S>,
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminAuth>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Admin authentication required")))
    }
}
