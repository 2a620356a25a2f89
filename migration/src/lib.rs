//! Database migrations for the Beacon survey service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_01_06_000001_create_clients;
mod m2025_01_06_000002_create_org_hierarchy;
mod m2025_01_06_000003_create_survey_tokens;
mod m2025_01_06_000004_create_survey_responses;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_06_000001_create_clients::Migration),
            Box::new(m2025_01_06_000002_create_org_hierarchy::Migration),
            Box::new(m2025_01_06_000003_create_survey_tokens::Migration),
            Box::new(m2025_01_06_000004_create_survey_responses::Migration),
        ]
    }
}
