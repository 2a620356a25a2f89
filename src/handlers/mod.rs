//! # API Handlers
//!
//! HTTP endpoint handlers for the Beacon API.

use crate::models::ServiceInfo;
use axum::response::Json;

pub mod admin;
pub mod clients;
pub mod dashboard;
pub mod demo;
pub mod export;
pub mod health;
pub mod responses;
pub mod sms;
pub mod surveys;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}
