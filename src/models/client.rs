//! Client entity model
//!
//! A client is an organisation being surveyed. Every other record is scoped to one.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Client entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Unique identifier for the client (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name for the client
    pub name: String,

    /// Timestamp when the client was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::client_config::Entity")]
    ClientConfig,
    #[sea_orm(has_many = "super::employee::Entity")]
    Employee,
}

impl Related<super::client_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientConfig.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
