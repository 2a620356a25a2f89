//! Client administration: creation, risk thresholds, org hierarchy and
//! employee roster.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::demo::OrgPlacement;
use crate::error::{ApiError, validation_error};
use crate::repositories::{
    ClientConfigRepository, ClientRepository, EmployeeRepository, HierarchyOutcome, HierarchyPlan,
    NewEmployee, OrganisationRepository,
};
use crate::risk::RiskThresholds;
use crate::server::AppState;
use crate::sms::validate_e164;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateClientRequest {
    #[schema(example = "Acme Logistics")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThresholdsResponse {
    pub client_id: Uuid,
    pub thresholds: RiskThresholds,
    /// True when the client has stored overrides
    pub overridden: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployeeRequest {
    pub first_name: Option<String>,
    /// E.164 mobile number
    #[schema(example = "+61412345678")]
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Team placement; division and department are derived from it
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub division_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Create a client
#[utoipa::path(
    post,
    path = "/api/clients",
    security(("bearer_auth" = [])),
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ClientResponse),
        (status = 400, description = "Invalid name", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<CreateClientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClientResponse>), ApiError> {
    let Json(request) = payload?;
    let client = ClientRepository::new(&state.db).create(&request.name).await?;

    Ok((
        StatusCode::CREATED,
        Json(ClientResponse {
            id: client.id,
            name: client.name,
            created_at: client.created_at.with_timezone(&Utc),
        }),
    ))
}

/// Resolved risk thresholds for a client
#[utoipa::path(
    get,
    path = "/api/clients/{id}/thresholds",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Resolved thresholds", body = ThresholdsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn get_thresholds(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<ThresholdsResponse>, ApiError> {
    ClientRepository::new(&state.db).require(client_id).await?;

    let repo = ClientConfigRepository::new(&state.db);
    let overridden = repo
        .find(client_id)
        .await?
        .and_then(|config| config.risk_thresholds)
        .and_then(|value| value.as_object().map(|map| !map.is_empty()))
        .unwrap_or(false);
    let thresholds = repo.resolve_thresholds(client_id).await;

    Ok(Json(ThresholdsResponse {
        client_id,
        thresholds,
        overridden,
    }))
}

/// Merge threshold overrides into the client's stored configuration
#[utoipa::path(
    put,
    path = "/api/clients/{id}/thresholds",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Client ID")),
    request_body(content = RiskThresholds, description = "Any subset of the threshold fields"),
    responses(
        (status = 200, description = "Updated thresholds", body = ThresholdsResponse),
        (status = 400, description = "Unknown key or value out of range", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn put_thresholds(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<ThresholdsResponse>, ApiError> {
    let Json(overrides) = payload?;
    ClientRepository::new(&state.db).require(client_id).await?;

    let thresholds = ClientConfigRepository::new(&state.db)
        .upsert_overrides(client_id, &overrides)
        .await?;

    tracing::info!(client_id = %client_id, keys = overrides.len(), "Updated risk thresholds");

    Ok(Json(ThresholdsResponse {
        client_id,
        thresholds,
        overridden: true,
    }))
}

/// Create or reuse divisions, departments and teams by name
#[utoipa::path(
    post,
    path = "/api/clients/{id}/hierarchy",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Client ID")),
    request_body = HierarchyPlan,
    responses(
        (status = 200, description = "Created and reused counts per level", body = HierarchyOutcome),
        (status = 400, description = "Invalid plan", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn setup_hierarchy(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    payload: Result<Json<HierarchyPlan>, JsonRejection>,
) -> Result<Json<HierarchyOutcome>, ApiError> {
    let Json(plan) = payload?;
    ClientRepository::new(&state.db).require(client_id).await?;

    let outcome = OrganisationRepository::new(&state.db)
        .setup_hierarchy(client_id, &plan)
        .await?;

    Ok(Json(outcome))
}

/// Add an employee to the client's roster
#[utoipa::path(
    post,
    path = "/api/clients/{id}/employees",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Client ID")),
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = EmployeeResponse),
        (status = 400, description = "Invalid phone or team", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    payload: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EmployeeResponse>), ApiError> {
    let Json(request) = payload?;
    ClientRepository::new(&state.db).require(client_id).await?;

    let phone = non_empty(request.phone)
        .map(|phone| validate_e164(&phone))
        .transpose()?;

    let placement = match request.team_id {
        Some(team_id) => OrganisationRepository::new(&state.db)
            .placement_for_team(client_id, team_id)
            .await?
            .ok_or_else(|| {
                validation_error("Unknown team", json!({ "team_id": "team does not exist" }))
            })?,
        None => OrgPlacement::default(),
    };

    let employee = EmployeeRepository::new(&state.db)
        .create(
            client_id,
            NewEmployee {
                first_name: non_empty(request.first_name),
                phone,
                email: non_empty(request.email),
                placement,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(EmployeeResponse {
            id: employee.id,
            client_id: employee.client_id,
            first_name: employee.first_name,
            phone: employee.phone,
            email: employee.email,
            division_id: employee.division_id,
            department_id: employee.department_id,
            team_id: employee.team_id,
        }),
    ))
}
