//! # Client Configuration Model
//!
//! Per-client risk threshold overrides. The stored JSON may be partial; it is
//! merged over [`RiskThresholds::default`] when read.

use sea_orm::{ActiveModelBehavior, DeriveEntityModel, EntityTrait, RelationDef, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::risk::RiskThresholds;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub client_id: Uuid,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub risk_thresholds: Option<Json>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_update = "Cascade",
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
    /// Resolve thresholds, merging stored overrides over the defaults
    pub fn thresholds(&self) -> RiskThresholds {
        match &self.risk_thresholds {
            Some(overrides) => RiskThresholds::default().with_overrides(overrides),
            None => RiskThresholds::default(),
        }
    }
}
