//! Synthetic data for demonstrations.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminAuth;
use crate::demo::{BALANCED_ROWS_PER_UNIT, DEMO_ROW_COUNT, generate, generate_balanced};
use crate::error::ApiError;
use crate::models::survey_response::ResponseSource;
use crate::repositories::{ClientRepository, OrganisationRepository, SurveyResponseRepository};
use crate::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DemoRequest {
    pub client_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DemoSeedResponse {
    pub ok: bool,
    pub inserted: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BalancedSeedRequest {
    pub client_id: Uuid,
    /// Remove earlier demo rows first; defaults to true
    pub clear_existing: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalancedSeedResponse {
    pub ok: bool,
    pub inserted: u64,
    /// Demo rows removed before seeding
    pub cleared: u64,
    /// Org units that received rows
    pub units: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DemoClearResponse {
    pub ok: bool,
    pub deleted: u64,
}

/// Insert synthetic responses spread over the last 60 days
#[utoipa::path(
    post,
    path = "/api/demo/seed",
    security(("bearer_auth" = [])),
    request_body = DemoRequest,
    responses(
        (status = 200, description = "Rows inserted", body = DemoSeedResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "demo"
)]
pub async fn seed(
    _admin: AdminAuth,
    State(state): State<AppState>,
    payload: Result<Json<DemoRequest>, JsonRejection>,
) -> Result<Json<DemoSeedResponse>, ApiError> {
    let Json(request) = payload?;
    ClientRepository::new(&state.db).require(request.client_id).await?;

    let placements = OrganisationRepository::new(&state.db)
        .list_placements(request.client_id)
        .await?;
    let rows = {
        let mut rng = rand::thread_rng();
        generate(&mut rng, Utc::now(), DEMO_ROW_COUNT, &placements)
    };

    let inserted = SurveyResponseRepository::new(&state.db)
        .insert_demo_batch(request.client_id, &rows)
        .await?;

    tracing::info!(client_id = %request.client_id, inserted, "Seeded demo responses");
    Ok(Json(DemoSeedResponse { ok: true, inserted }))
}

/// Insert the same number of synthetic responses for every org unit,
/// cycling units through thriving, mixed and critical profiles
#[utoipa::path(
    post,
    path = "/api/demo/seed-balanced",
    security(("bearer_auth" = [])),
    request_body = BalancedSeedRequest,
    responses(
        (status = 200, description = "Rows inserted", body = BalancedSeedResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "demo"
)]
pub async fn seed_balanced(
    _admin: AdminAuth,
    State(state): State<AppState>,
    payload: Result<Json<BalancedSeedRequest>, JsonRejection>,
) -> Result<Json<BalancedSeedResponse>, ApiError> {
    let Json(request) = payload?;
    let client_id = request.client_id;
    ClientRepository::new(&state.db).require(client_id).await?;

    let responses = SurveyResponseRepository::new(&state.db);
    let cleared = if request.clear_existing.unwrap_or(true) {
        responses
            .delete_by_source(client_id, ResponseSource::DemoSeed)
            .await?
    } else {
        0
    };

    let placements = OrganisationRepository::new(&state.db)
        .list_placements(client_id)
        .await?;
    let rows = {
        let mut rng = rand::thread_rng();
        generate_balanced(&mut rng, Utc::now(), BALANCED_ROWS_PER_UNIT, &placements)
    };
    let inserted = responses.insert_demo_batch(client_id, &rows).await?;
    let units = placements.len().max(1) as u64;

    tracing::info!(client_id = %client_id, inserted, cleared, units, "Seeded balanced demo responses");
    Ok(Json(BalancedSeedResponse {
        ok: true,
        inserted,
        cleared,
        units,
    }))
}

/// Delete every synthetic response of the client
#[utoipa::path(
    post,
    path = "/api/demo/clear",
    security(("bearer_auth" = [])),
    request_body = DemoRequest,
    responses(
        (status = 200, description = "Rows deleted", body = DemoClearResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "demo"
)]
pub async fn clear(
    _admin: AdminAuth,
    State(state): State<AppState>,
    payload: Result<Json<DemoRequest>, JsonRejection>,
) -> Result<Json<DemoClearResponse>, ApiError> {
    let Json(request) = payload?;
    ClientRepository::new(&state.db).require(request.client_id).await?;

    let deleted = SurveyResponseRepository::new(&state.db)
        .delete_by_source(request.client_id, ResponseSource::DemoSeed)
        .await?;

    tracing::info!(client_id = %request.client_id, deleted, "Cleared demo responses");
    Ok(Json(DemoClearResponse { ok: true, deleted }))
}
