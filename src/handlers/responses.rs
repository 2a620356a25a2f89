//! Survey response submission.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, invalid_or_expired_token, validation_error};
use crate::repositories::{ResponseSubmission, SupportRequest, SurveyTokenRepository};
use crate::scoring::ThreePointAnswers;
use crate::server::AppState;

const MAX_COMMENT_CHARS: usize = 2000;
const MAX_SUPPORT_FIELD_CHARS: usize = 200;

/// Submitted survey answers on the 3-point scale (1 is most favourable).
///
/// Any 5-point values sent by the client are ignored; they are always
/// derived on write.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitResponseRequest {
    #[schema(example = "5f0c6a4e-8d1b-4a57-9e43-2c1f0b7d9a10")]
    pub token: String,
    #[schema(example = 1)]
    pub sentiment_3: i64,
    #[schema(example = 2)]
    pub clarity_3: i64,
    #[schema(example = 2)]
    pub workload_3: i64,
    #[schema(example = 1)]
    pub safety_3: i64,
    #[schema(example = 3)]
    pub leadership_3: i64,
    pub comment_text: Option<String>,
    #[serde(default)]
    pub support_requested: bool,
    pub support_contact_method: Option<String>,
    pub support_contact_value: Option<String>,
    pub support_timeframe: Option<String>,
    #[serde(default)]
    pub high_risk_flag: bool,
    /// JSON array of self-reported risk factors
    pub risk_factors: Option<Value>,
    /// Free-form JSON object of client metadata
    pub meta: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponseResult {
    pub ok: bool,
    pub response_id: Uuid,
}

fn optional_text(value: Option<String>, field: &str, max: usize) -> Result<Option<String>, ApiError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max {
        return Err(validation_error(
            "Field too long",
            json!({ field: format!("must be at most {} characters", max) }),
        ));
    }
    Ok(Some(value))
}

impl SubmitResponseRequest {
    fn into_submission(self) -> Result<(Uuid, ResponseSubmission), ApiError> {
        let token_id = Uuid::parse_str(self.token.trim()).map_err(|_| invalid_or_expired_token())?;

        let answers = ThreePointAnswers::try_new(
            self.sentiment_3,
            self.clarity_3,
            self.workload_3,
            self.safety_3,
            self.leadership_3,
        )
        .map_err(|error| validation_error("Invalid answers", json!({ "answers": error.to_string() })))?;

        if let Some(factors) = &self.risk_factors
            && !factors.is_array()
        {
            return Err(validation_error(
                "Invalid risk_factors",
                json!({ "risk_factors": "must be an array" }),
            ));
        }
        if let Some(meta) = &self.meta
            && !meta.is_object()
        {
            return Err(validation_error("Invalid meta", json!({ "meta": "must be an object" })));
        }

        let submission = ResponseSubmission {
            answers,
            comment_text: optional_text(self.comment_text, "comment_text", MAX_COMMENT_CHARS)?,
            support: SupportRequest {
                requested: self.support_requested,
                contact_method: optional_text(
                    self.support_contact_method,
                    "support_contact_method",
                    MAX_SUPPORT_FIELD_CHARS,
                )?,
                contact_value: optional_text(
                    self.support_contact_value,
                    "support_contact_value",
                    MAX_SUPPORT_FIELD_CHARS,
                )?,
                timeframe: optional_text(
                    self.support_timeframe,
                    "support_timeframe",
                    MAX_SUPPORT_FIELD_CHARS,
                )?,
                high_risk: self.high_risk_flag,
            },
            risk_factors: self.risk_factors,
            meta: self.meta,
        };

        Ok((token_id, submission))
    }
}

/// Submit a survey response, consuming its token
#[utoipa::path(
    post,
    path = "/api/responses",
    request_body = SubmitResponseRequest,
    responses(
        (status = 201, description = "Response recorded", body = SubmitResponseResult),
        (status = 400, description = "Invalid answers or unusable token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "responses"
)]
pub async fn submit_response(
    State(state): State<AppState>,
    payload: Result<Json<SubmitResponseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponseResult>), ApiError> {
    let Json(request) = payload?;
    let (token_id, submission) = request.into_submission()?;

    let response = SurveyTokenRepository::new(&state.db)
        .consume_and_record(token_id, submission)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponseResult {
            ok: true,
            response_id: response.id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(token: &str) -> SubmitResponseRequest {
        serde_json::from_value(json!({
            "token": token,
            "sentiment_3": 1,
            "clarity_3": 2,
            "workload_3": 3,
            "safety_3": 1,
            "leadership_3": 2,
            "sentiment_5": 1,
            "comment_text": "  fine  "
        }))
        .unwrap()
    }

    #[test]
    fn converts_valid_request() {
        let token = Uuid::new_v4();
        let (token_id, submission) = request(&token.to_string()).into_submission().unwrap();
        assert_eq!(token_id, token);
        assert_eq!(submission.answers.to_five_point().sentiment, 5);
        assert_eq!(submission.comment_text.as_deref(), Some("fine"));
        assert!(!submission.support.requested);
    }

    #[test]
    fn unparseable_token_is_invalid_or_expired() {
        let error = request("not-a-token").into_submission().unwrap_err();
        assert_eq!(error.code, Box::from("INVALID_OR_EXPIRED_TOKEN"));
    }

    #[test]
    fn out_of_range_answer_is_rejected() {
        let mut req = request(&Uuid::new_v4().to_string());
        req.workload_3 = 4;
        let error = req.into_submission().unwrap_err();
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
    }

    #[test]
    fn long_comment_is_rejected() {
        let mut req = request(&Uuid::new_v4().to_string());
        req.comment_text = Some("x".repeat(MAX_COMMENT_CHARS + 1));
        let error = req.into_submission().unwrap_err();
        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert!(error.details.unwrap()["comment_text"].is_string());
    }

    #[test]
    fn risk_factors_must_be_an_array() {
        let mut req = request(&Uuid::new_v4().to_string());
        req.risk_factors = Some(json!({ "workload": true }));
        assert!(req.into_submission().is_err());
    }
}
