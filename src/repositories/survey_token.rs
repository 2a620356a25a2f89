//! # Survey Token Repository
//!
//! Issues single-use survey tokens and consumes them together with the
//! response they authorise.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::survey_response::Model as ResponseModel;
use crate::models::survey_token::{
    ActiveModel as TokenActiveModel, Column, Model as TokenModel, TokenChannel, TokenStatus,
};
use crate::models::{Employee, SurveyToken};
use crate::repositories::survey_response::{ResponseSubmission, insert_submission};

/// Allowed token lifetimes in days
pub const TTL_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=30;
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Parameters for a new token
#[derive(Debug, Clone)]
pub struct IssueToken {
    pub client_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub channel: TokenChannel,
    pub ttl_days: i64,
}

/// Repository for SurveyToken database operations
pub struct SurveyTokenRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SurveyTokenRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create an `issued` token valid for `ttl_days` from now
    pub async fn issue(&self, request: IssueToken) -> Result<TokenModel, RepositoryError> {
        if !TTL_DAYS_RANGE.contains(&request.ttl_days) {
            return Err(RepositoryError::validation_error(format!(
                "ttl_days must be between {} and {}",
                TTL_DAYS_RANGE.start(),
                TTL_DAYS_RANGE.end()
            )));
        }

        let now = Utc::now();
        let token = TokenActiveModel {
            id: Set(Uuid::new_v4()),
            client_id: Set(request.client_id),
            employee_id: Set(request.employee_id),
            channel: Set(request.channel.as_str().to_string()),
            status: Set(TokenStatus::Issued.as_str().to_string()),
            valid_until: Set((now + Duration::days(request.ttl_days)).into()),
            consumed_at: Set(None),
            created_at: Set(now.into()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)?;

        counter!("beacon_tokens_issued_total", "channel" => request.channel.as_str()).increment(1);
        tracing::debug!(
            token_id = %token.id,
            client_id = %token.client_id,
            channel = %request.channel,
            "Issued survey token"
        );

        Ok(token)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TokenModel>, RepositoryError> {
        SurveyToken::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Consume the token and record its response in one transaction.
    ///
    /// The token is flipped to `consumed` only if it is still `issued` and
    /// inside its window; when no row matches, nothing is written and
    /// [`RepositoryError::TokenUnavailable`] is returned.
    pub async fn consume_and_record(
        &self,
        token_id: Uuid,
        submission: ResponseSubmission,
    ) -> Result<ResponseModel, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let txn = self.db.begin().await?;

        // Claim first so a concurrent submission blocks on the write and
        // then sees the token already consumed.
        let updated = SurveyToken::update_many()
            .col_expr(Column::Status, Expr::value(TokenStatus::Consumed.as_str()))
            .col_expr(Column::ConsumedAt, Expr::value(now))
            .filter(Column::Id.eq(token_id))
            .filter(Column::Status.eq(TokenStatus::Issued.as_str()))
            .filter(Column::ValidUntil.gt(now))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            txn.rollback().await?;
            tracing::info!(token_id = %token_id, "Rejected submission for unusable token");
            return Err(RepositoryError::TokenUnavailable);
        }

        let Some(token) = SurveyToken::find_by_id(token_id).one(&txn).await? else {
            txn.rollback().await?;
            return Err(RepositoryError::TokenUnavailable);
        };

        let employee = match token.employee_id {
            Some(employee_id) => Employee::find_by_id(employee_id).one(&txn).await?,
            None => None,
        };

        let response = insert_submission(&txn, &token, employee.as_ref(), submission, now).await?;
        txn.commit().await?;

        counter!("beacon_responses_recorded_total").increment(1);
        tracing::info!(
            token_id = %token_id,
            client_id = %token.client_id,
            response_id = %response.id,
            "Recorded survey response"
        );

        Ok(response)
    }
}
