//! # Data Models
//!
//! This module contains all the data models used throughout the Beacon service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod client;
pub mod client_config;
pub mod department;
pub mod division;
pub mod employee;
pub mod survey_response;
pub mod survey_token;
pub mod team;

pub use client::Entity as Client;
pub use client_config::Entity as ClientConfig;
pub use department::Entity as Department;
pub use division::Entity as Division;
pub use employee::Entity as Employee;
pub use survey_response::Entity as SurveyResponse;
pub use survey_token::Entity as SurveyToken;
pub use team::Entity as Team;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "beacon".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
