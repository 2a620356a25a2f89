//! Dashboard aggregates for one client.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::dashboard::{DashboardAggregates, OrgScope, Period, ViewMode, aggregate, window_start};
use crate::error::ApiError;
use crate::repositories::{
    ClientConfigRepository, ClientRepository, DashboardRows, EmployeeRepository,
    SurveyResponseRepository,
};
use crate::risk::RiskThresholds;
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    pub client_id: Uuid,
    /// this_month, last_month, last_3_months, last_6_months, last_12_months,
    /// week, month, quarter or all
    pub period: Option<String>,
    /// `live` restricts the window to the current UTC day
    pub mode: Option<String>,
    pub division_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub client_id: Uuid,
    pub period: Period,
    pub mode: ViewMode,
    pub scope: OrgScope,
    /// Inclusive lower bound applied to `submitted_at`, if any
    pub window_start: Option<DateTime<Utc>>,
    /// Maximum number of rows folded into the aggregates
    pub row_cap: u64,
    /// True when more rows matched than the cap allowed
    pub truncated: bool,
    pub thresholds: RiskThresholds,
    #[serde(flatten)]
    pub aggregates: DashboardAggregates,
}

/// Wellbeing, participation and risk signals for a client
#[utoipa::path(
    get,
    path = "/api/dashboard",
    security(("bearer_auth" = [])),
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard aggregates", body = DashboardResponse),
        (status = 400, description = "Invalid query", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let Query(query) = query?;
    let client_id = query.client_id;

    ClientRepository::new(&state.db).require(client_id).await?;
    let thresholds = ClientConfigRepository::new(&state.db)
        .resolve_thresholds(client_id)
        .await;

    let period = Period::parse(query.period.as_deref());
    let mode = ViewMode::parse(query.mode.as_deref());
    let scope = OrgScope::resolve(query.division_id, query.department_id, query.team_id);
    let since = window_start(period, mode, Utc::now());
    let row_cap = state.config.dashboard_max_rows;

    let DashboardRows { rows, truncated } = SurveyResponseRepository::new(&state.db)
        .list_for_dashboard(client_id, since, scope, row_cap)
        .await?;
    let eligible = EmployeeRepository::new(&state.db)
        .count_eligible(client_id, scope)
        .await?;

    let aggregates = aggregate(&rows, eligible, &thresholds);

    tracing::debug!(
        client_id = %client_id,
        period = ?period,
        mode = ?mode,
        rows = rows.len(),
        truncated,
        eligible,
        "Computed dashboard aggregates"
    );

    Ok(Json(DashboardResponse {
        client_id,
        period,
        mode,
        scope,
        window_start: since,
        row_cap,
        truncated,
        thresholds,
        aggregates,
    }))
}
