//! Bulk SMS delivery of survey links, configuration status and test sends.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::links::{OriginSources, survey_url};
use crate::models::employee::Model as EmployeeModel;
use crate::models::survey_token::TokenChannel;
use crate::repositories::{
    ClientRepository, DEFAULT_TTL_DAYS, EmployeeRepository, IssueToken, SurveyTokenRepository,
};
use crate::server::AppState;
use crate::sms::{render_message, validate_e164, validate_test_number, with_sender};

/// Link path used by test sends; it never maps to a real token
const TEST_SURVEY_PATH: &str = "/survey/test-demo";

#[derive(Debug, Deserialize, ToSchema)]
pub struct SmsBatchRequest {
    pub client_id: Uuid,
    /// Message template; `{{link}}` and `{{first_name}}` are substituted
    #[schema(example = "Hi {{first_name}}, your weekly check-in: {{link}}")]
    pub message: Option<String>,
    /// Origin for survey links; overrides the configured public URL
    pub base_url: Option<String>,
}

/// One employee the batch could not reach
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SmsDeliveryError {
    pub employee_id: Uuid,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SmsBatchResponse {
    pub ok: bool,
    pub sent: u32,
    pub failed: u32,
    pub errors: Vec<SmsDeliveryError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SmsStatusResponse {
    pub twilio_configured: bool,
    /// Names of the missing settings
    pub missing: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SmsTestRequest {
    /// Australian mobile in E.164 form
    #[schema(example = "+61412345678")]
    pub phone: String,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SmsTestResponse {
    pub ok: bool,
    pub to: String,
    pub sid: Option<String>,
}

async fn deliver(
    state: &AppState,
    employee: &EmployeeModel,
    origin: &str,
    template: Option<&str>,
) -> Result<(), String> {
    let phone = employee
        .phone
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| "no phone number on record".to_string())?;
    let phone = validate_e164(phone).map_err(|e| e.to_string())?;

    let token = SurveyTokenRepository::new(&state.db)
        .issue(IssueToken {
            client_id: employee.client_id,
            employee_id: Some(employee.id),
            channel: TokenChannel::Sms,
            ttl_days: DEFAULT_TTL_DAYS,
        })
        .await
        .map_err(|e| e.to_string())?;

    let link = survey_url(origin, token.id);
    let body = with_sender(
        state.config.sms_sender_name.as_deref(),
        render_message(template, &link, employee.first_name.as_deref()),
    );

    state
        .sms
        .send(&phone, &body)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Issue a token and text a survey link to every active employee
#[utoipa::path(
    post,
    path = "/api/admin/sms/batch",
    security(("bearer_auth" = [])),
    request_body = SmsBatchRequest,
    responses(
        (status = 200, description = "Per-employee outcome counts", body = SmsBatchResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError),
        (status = 503, description = "SMS delivery not configured", body = ApiError)
    ),
    tag = "sms"
)]
pub async fn send_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SmsBatchRequest>, JsonRejection>,
) -> Result<Json<SmsBatchResponse>, ApiError> {
    let Json(request) = payload?;

    // Fail closed before any token is issued.
    state.sms.ensure_configured()?;
    ClientRepository::new(&state.db).require(request.client_id).await?;

    let employees = EmployeeRepository::new(&state.db)
        .list_active(request.client_id)
        .await?;

    let origin = OriginSources {
        base_url: request.base_url.as_deref(),
        public_url: state.config.public_url.as_deref(),
        ..Default::default()
    }
    .with_headers(&headers)
    .resolve();

    let mut sent = 0;
    let mut errors = Vec::new();
    for employee in &employees {
        match deliver(&state, employee, &origin, request.message.as_deref()).await {
            Ok(()) => sent += 1,
            Err(error) => {
                tracing::warn!(employee_id = %employee.id, error = %error, "SMS delivery failed");
                errors.push(SmsDeliveryError {
                    employee_id: employee.id,
                    error,
                });
            }
        }
    }

    tracing::info!(
        client_id = %request.client_id,
        sent,
        failed = errors.len(),
        "Completed SMS batch"
    );

    Ok(Json(SmsBatchResponse {
        ok: true,
        sent,
        failed: errors.len() as u32,
        errors,
    }))
}

/// Report whether SMS credentials are configured
#[utoipa::path(
    get,
    path = "/api/sms/status",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Configuration status", body = SmsStatusResponse),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "sms"
)]
pub async fn sms_status(State(state): State<AppState>) -> Json<SmsStatusResponse> {
    let missing = state.sms.missing_configuration();
    Json(SmsStatusResponse {
        twilio_configured: missing.is_empty(),
        missing,
    })
}

/// Send one test message to an Australian mobile
#[utoipa::path(
    post,
    path = "/api/sms/test",
    security(("bearer_auth" = [])),
    request_body = SmsTestRequest,
    responses(
        (status = 200, description = "Message accepted by the provider", body = SmsTestResponse),
        (status = 400, description = "Invalid phone number", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 502, description = "Provider rejected the message", body = ApiError),
        (status = 503, description = "SMS delivery not configured", body = ApiError)
    ),
    tag = "sms"
)]
pub async fn send_test(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SmsTestRequest>, JsonRejection>,
) -> Result<Json<SmsTestResponse>, ApiError> {
    let Json(request) = payload?;

    state.sms.ensure_configured()?;
    let phone = validate_test_number(&request.phone)?;

    let origin = OriginSources {
        public_url: state.config.public_url.as_deref(),
        ..Default::default()
    }
    .with_headers(&headers)
    .resolve();
    let link = format!("{}{}", origin, TEST_SURVEY_PATH);
    let body = with_sender(
        state.config.sms_sender_name.as_deref(),
        render_message(request.message.as_deref(), &link, None),
    );

    let receipt = state.sms.send(&phone, &body).await?;

    Ok(Json(SmsTestResponse {
        ok: true,
        to: phone,
        sid: receipt.sid,
    }))
}
