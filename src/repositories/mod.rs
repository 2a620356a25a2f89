//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for each
//! entity. Every query is scoped to a client.

pub mod client;
pub mod client_config;
pub mod employee;
pub mod organisation;
pub mod survey_response;
pub mod survey_token;

pub use client::ClientRepository;
pub use client_config::ClientConfigRepository;
pub use employee::{EmployeeRepository, NewEmployee};
pub use organisation::{HierarchyOutcome, HierarchyPlan, LevelOutcome, OrganisationRepository};
pub use survey_response::{
    DashboardRows, ResponseSubmission, SupportRequest, SurveyResponseRepository,
};
pub use survey_token::{DEFAULT_TTL_DAYS, IssueToken, SurveyTokenRepository, TTL_DAYS_RANGE};
