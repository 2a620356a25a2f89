//! Admin password login and logout.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, header},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::{clear_session_cookie, session_cookie, session_token, verify_password};
use crate::error::{ApiError, configuration_error, unauthorized};
use crate::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

fn with_cookie(cookie: String) -> Result<Response, ApiError> {
    let value = HeaderValue::from_str(&cookie).map_err(anyhow::Error::from)?;
    let mut response = Json(OkResponse { ok: true }).into_response();
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(response)
}

/// Exchange the admin password for a session cookie
#[utoipa::path(
    post,
    path = "/api/admin/auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; sets the session cookie", body = OkResponse),
        (status = 401, description = "Wrong password", body = ApiError),
        (status = 503, description = "No admin password configured", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;

    let Some(password) = state
        .config
        .admin_password
        .as_deref()
        .filter(|p| !p.is_empty())
    else {
        return Err(configuration_error(
            "Admin login is not configured",
            json!({ "missing": ["BEACON_ADMIN_PASSWORD"] }),
        ));
    };

    if !verify_password(&state.config, &request.password) {
        tracing::warn!("Rejected admin login");
        return Err(unauthorized(Some("Invalid password")));
    }

    let token = session_token(password, Utc::now().timestamp())
        .ok_or_else(|| anyhow::anyhow!("failed to derive admin session token"))?;

    tracing::info!("Admin session started");
    with_cookie(session_cookie(&state.config, &token))
}

/// Clear the admin session cookie
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses((status = 200, description = "Session cookie cleared", body = OkResponse)),
    tag = "admin"
)]
pub async fn logout(State(state): State<AppState>) -> Result<Response, ApiError> {
    with_cookie(clear_session_cookie(&state.config))
}
