//! CSV export of survey responses.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::ApiError;
use crate::export::{EXPORT_FILENAME, render_csv};
use crate::repositories::{ClientRepository, SurveyResponseRepository};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Client whose responses are exported
    pub client_id: Uuid,
}

/// Download the client's most recent responses as CSV
#[utoipa::path(
    get,
    path = "/api/export",
    security(("bearer_auth" = [])),
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid query", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "export"
)]
pub async fn export_responses(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;

    ClientRepository::new(&state.db).require(query.client_id).await?;

    let rows = SurveyResponseRepository::new(&state.db)
        .list_for_export(query.client_id, state.config.export_max_rows)
        .await?;

    let body = render_csv(&rows).map_err(anyhow::Error::from)?;

    tracing::info!(
        client_id = %query.client_id,
        rows = rows.len(),
        "Exported survey responses"
    );

    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILENAME);
    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
