//! Survey token issuance and lookup.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, not_found, validation_error};
use crate::links::{OriginSources, survey_url};
use crate::models::survey_token::{TokenChannel, TokenState};
use crate::repositories::{
    ClientRepository, DEFAULT_TTL_DAYS, EmployeeRepository, IssueToken, SurveyTokenRepository,
    TTL_DAYS_RANGE,
};
use crate::server::AppState;

/// Request body for issuing a survey token
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueTokenRequest {
    pub client_id: Uuid,
    pub employee_id: Option<Uuid>,
    /// Validity window in days, 1 to 30
    #[schema(example = 7)]
    pub ttl_days: Option<i64>,
    #[serde(default)]
    pub channel: TokenChannel,
    /// Origin for the survey link; overrides every other source
    #[schema(example = "https://survey.example.com")]
    pub base_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueTokenResponse {
    pub token: Uuid,
    pub valid_until: DateTime<Utc>,
    #[schema(example = "https://survey.example.com/survey/5f0c6a4e-8d1b-4a57-9e43-2c1f0b7d9a10")]
    pub url: String,
    pub channel: TokenChannel,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenStatusResponse {
    pub token: Uuid,
    pub state: TokenState,
    pub valid_until: DateTime<Utc>,
    pub client_id: Uuid,
}

/// Issue a single-use survey token
#[utoipa::path(
    post,
    path = "/api/surveys/issue",
    security(("bearer_auth" = [])),
    request_body = IssueTokenRequest,
    responses(
        (status = 201, description = "Token issued", body = IssueTokenResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client or employee not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "surveys"
)]
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<IssueTokenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssueTokenResponse>), ApiError> {
    let Json(request) = payload?;

    ClientRepository::new(&state.db)
        .require(request.client_id)
        .await?;

    if let Some(employee_id) = request.employee_id {
        let employee = EmployeeRepository::new(&state.db)
            .find_by_id(employee_id)
            .await?
            .filter(|employee| employee.client_id == request.client_id);
        if employee.is_none() {
            return Err(not_found(&format!(
                "Employee {} not found for client {}",
                employee_id, request.client_id
            )));
        }
    }

    let ttl_days = request.ttl_days.unwrap_or(DEFAULT_TTL_DAYS);
    if !TTL_DAYS_RANGE.contains(&ttl_days) {
        return Err(validation_error(
            "Invalid ttl_days",
            json!({ "ttl_days": "must be between 1 and 30" }),
        ));
    }

    let token = SurveyTokenRepository::new(&state.db)
        .issue(IssueToken {
            client_id: request.client_id,
            employee_id: request.employee_id,
            channel: request.channel,
            ttl_days,
        })
        .await?;

    let origin = OriginSources {
        base_url: request.base_url.as_deref(),
        public_url: state.config.public_url.as_deref(),
        ..Default::default()
    }
    .with_headers(&headers)
    .resolve();

    Ok((
        StatusCode::CREATED,
        Json(IssueTokenResponse {
            token: token.id,
            valid_until: token.valid_until.with_timezone(&Utc),
            url: survey_url(&origin, token.id),
            channel: request.channel,
        }),
    ))
}

/// Look up a token so the survey form knows whether to render
#[utoipa::path(
    get,
    path = "/api/surveys/{token}",
    params(("token" = String, Path, description = "Survey token")),
    responses(
        (status = 200, description = "Token status", body = TokenStatusResponse),
        (status = 404, description = "Unknown token", body = ApiError)
    ),
    tag = "surveys"
)]
pub async fn token_status(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<TokenStatusResponse>, ApiError> {
    let token_id = Uuid::parse_str(token.trim()).map_err(|_| not_found("Survey token not found"))?;

    let token = SurveyTokenRepository::new(&state.db)
        .find_by_id(token_id)
        .await?
        .ok_or_else(|| not_found("Survey token not found"))?;

    Ok(Json(TokenStatusResponse {
        token: token.id,
        state: token.state_at(Utc::now()),
        valid_until: token.valid_until.with_timezone(&Utc),
        client_id: token.client_id,
    }))
}
