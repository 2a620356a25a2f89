//! # Survey Response Model
//!
//! Immutable record of one submission. The `*_5` columns are always derived
//! from the `*_3` columns on write. `source` tags provenance so synthetic
//! rows can be removed in bulk.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::scoring::Domain;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "survey_responses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub token_id: Option<Uuid>,
    pub client_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub sentiment_3: Option<i32>,
    pub sentiment_5: Option<i32>,
    pub clarity_3: Option<i32>,
    pub clarity_5: Option<i32>,
    pub workload_3: Option<i32>,
    pub workload_5: Option<i32>,
    pub safety_3: Option<i32>,
    pub safety_5: Option<i32>,
    pub leadership_3: Option<i32>,
    pub leadership_5: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment_text: Option<String>,
    pub support_requested: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub support_contact_method: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub support_contact_value: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub support_timeframe: Option<String>,
    pub high_risk_flag: bool,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub risk_factors: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub meta: Option<Json>,
    pub source: String,
    pub submitted_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "Cascade"
    )]
    Client,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Raw 3-point answer for a domain
    pub fn three_point(&self, domain: Domain) -> Option<i32> {
        match domain {
            Domain::Sentiment => self.sentiment_3,
            Domain::Clarity => self.clarity_3,
            Domain::Workload => self.workload_3,
            Domain::Safety => self.safety_3,
            Domain::Leadership => self.leadership_3,
        }
    }

    /// Mapped 5-point value for a domain
    pub fn five_point(&self, domain: Domain) -> Option<i32> {
        match domain {
            Domain::Sentiment => self.sentiment_5,
            Domain::Clarity => self.clarity_5,
            Domain::Workload => self.workload_5,
            Domain::Safety => self.safety_5,
            Domain::Leadership => self.leadership_5,
        }
    }
}

/// Provenance of a response row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Submitted by an employee through a survey token
    Survey,
    /// Generated by the demo seeder
    DemoSeed,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Survey => "survey",
            ResponseSource::DemoSeed => "demo_seed",
        }
    }
}
