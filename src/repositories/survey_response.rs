//! # Survey Response Repository
//!
//! Inserts responses (always deriving the 5-point columns from the 3-point
//! answers) and runs the filtered reads behind the dashboard and export.

use chrono::{DateTime, FixedOffset, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::dashboard::OrgScope;
use crate::demo::DemoResponse;
use crate::error::RepositoryError;
use crate::models::SurveyResponse;
use crate::models::employee::Model as EmployeeModel;
use crate::models::survey_response::{
    ActiveModel as ResponseActiveModel, Column, Model as ResponseModel, ResponseSource,
};
use crate::models::survey_token::Model as TokenModel;
use crate::scoring::ThreePointAnswers;

/// A validated submission ready to be stored
#[derive(Debug, Clone)]
pub struct ResponseSubmission {
    pub answers: ThreePointAnswers,
    pub comment_text: Option<String>,
    pub support: SupportRequest,
    pub risk_factors: Option<Value>,
    pub meta: Option<Value>,
}

/// Optional support-path details attached to a response
#[derive(Debug, Clone, Default)]
pub struct SupportRequest {
    pub requested: bool,
    pub contact_method: Option<String>,
    pub contact_value: Option<String>,
    pub timeframe: Option<String>,
    pub high_risk: bool,
}

fn answer_columns(model: &mut ResponseActiveModel, answers: &ThreePointAnswers) {
    let five = answers.to_five_point();
    model.sentiment_3 = Set(Some(i32::from(answers.sentiment)));
    model.sentiment_5 = Set(Some(i32::from(five.sentiment)));
    model.clarity_3 = Set(Some(i32::from(answers.clarity)));
    model.clarity_5 = Set(Some(i32::from(five.clarity)));
    model.workload_3 = Set(Some(i32::from(answers.workload)));
    model.workload_5 = Set(Some(i32::from(five.workload)));
    model.safety_3 = Set(Some(i32::from(answers.safety)));
    model.safety_5 = Set(Some(i32::from(five.safety)));
    model.leadership_3 = Set(Some(i32::from(answers.leadership)));
    model.leadership_5 = Set(Some(i32::from(five.leadership)));
}

fn base_model(client_id: Uuid, source: ResponseSource, submitted_at: DateTime<FixedOffset>) -> ResponseActiveModel {
    ResponseActiveModel {
        id: Set(Uuid::new_v4()),
        token_id: Set(None),
        client_id: Set(client_id),
        employee_id: Set(None),
        division_id: Set(None),
        department_id: Set(None),
        team_id: Set(None),
        comment_text: Set(None),
        support_requested: Set(false),
        support_contact_method: Set(None),
        support_contact_value: Set(None),
        support_timeframe: Set(None),
        high_risk_flag: Set(false),
        risk_factors: Set(None),
        meta: Set(None),
        source: Set(source.as_str().to_string()),
        submitted_at: Set(submitted_at),
        ..Default::default()
    }
}

/// Insert the response authorised by `token`. Org keys are copied from the
/// employee as they stand at submission time.
pub(crate) async fn insert_submission<C: ConnectionTrait>(
    conn: &C,
    token: &TokenModel,
    employee: Option<&EmployeeModel>,
    submission: ResponseSubmission,
    submitted_at: DateTime<FixedOffset>,
) -> Result<ResponseModel, RepositoryError> {
    let mut model = base_model(token.client_id, ResponseSource::Survey, submitted_at);
    answer_columns(&mut model, &submission.answers);
    model.token_id = Set(Some(token.id));
    model.employee_id = Set(token.employee_id);
    if let Some(employee) = employee {
        model.division_id = Set(employee.division_id);
        model.department_id = Set(employee.department_id);
        model.team_id = Set(employee.team_id);
    }
    model.comment_text = Set(submission.comment_text);
    model.support_requested = Set(submission.support.requested);
    model.support_contact_method = Set(submission.support.contact_method);
    model.support_contact_value = Set(submission.support.contact_value);
    model.support_timeframe = Set(submission.support.timeframe);
    model.high_risk_flag = Set(submission.support.high_risk);
    model.risk_factors = Set(submission.risk_factors);
    model.meta = Set(submission.meta);

    model.insert(conn).await.map_err(RepositoryError::database_error)
}

/// Dashboard rows plus whether the cap cut anything off
#[derive(Debug, Clone)]
pub struct DashboardRows {
    pub rows: Vec<ResponseModel>,
    pub truncated: bool,
}

/// Repository for SurveyResponse database operations
pub struct SurveyResponseRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SurveyResponseRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Rows for the dashboard in submission order. When more than `cap`
    /// rows match, the most recent `cap` are kept and `truncated` is set.
    pub async fn list_for_dashboard(
        &self,
        client_id: Uuid,
        since: Option<DateTime<Utc>>,
        scope: OrgScope,
        cap: u64,
    ) -> Result<DashboardRows, RepositoryError> {
        let mut query = SurveyResponse::find().filter(Column::ClientId.eq(client_id));
        if let Some(since) = since {
            let since: DateTime<FixedOffset> = since.into();
            query = query.filter(Column::SubmittedAt.gte(since));
        }
        query = match scope {
            OrgScope::All => query,
            OrgScope::Division(id) => query.filter(Column::DivisionId.eq(id)),
            OrgScope::Department(id) => query.filter(Column::DepartmentId.eq(id)),
            OrgScope::Team(id) => query.filter(Column::TeamId.eq(id)),
        };

        // one extra row tells a full page apart from a cut one
        let mut rows = query
            .order_by_desc(Column::SubmittedAt)
            .limit(cap.saturating_add(1))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        let truncated = rows.len() as u64 > cap;
        rows.truncate(usize::try_from(cap).unwrap_or(usize::MAX));
        rows.reverse();
        Ok(DashboardRows { rows, truncated })
    }

    /// Rows for the CSV export, newest first
    pub async fn list_for_export(
        &self,
        client_id: Uuid,
        cap: u64,
    ) -> Result<Vec<ResponseModel>, RepositoryError> {
        SurveyResponse::find()
            .filter(Column::ClientId.eq(client_id))
            .order_by_desc(Column::SubmittedAt)
            .limit(cap)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Insert generated rows tagged `demo_seed`
    pub async fn insert_demo_batch(
        &self,
        client_id: Uuid,
        rows: &[DemoResponse],
    ) -> Result<u64, RepositoryError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let models = rows.iter().map(|row| {
            let mut model = base_model(client_id, ResponseSource::DemoSeed, row.submitted_at.into());
            answer_columns(&mut model, &row.answers);
            model.division_id = Set(row.placement.division_id);
            model.department_id = Set(row.placement.department_id);
            model.team_id = Set(row.placement.team_id);
            model
        });

        SurveyResponse::insert_many(models)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let inserted = rows.len() as u64;
        counter!("beacon_demo_rows_seeded_total").increment(inserted);
        Ok(inserted)
    }

    /// Delete every row of the client carrying `source`, returning the count
    pub async fn delete_by_source(
        &self,
        client_id: Uuid,
        source: ResponseSource,
    ) -> Result<u64, RepositoryError> {
        let result = SurveyResponse::delete_many()
            .filter(Column::ClientId.eq(client_id))
            .filter(Column::Source.eq(source.as_str()))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if source == ResponseSource::DemoSeed {
            counter!("beacon_demo_rows_cleared_total").increment(result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}
