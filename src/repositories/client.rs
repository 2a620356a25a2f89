//! # Client Repository
//!
//! Creation and lookup of surveyed organisations.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::client::{ActiveModel as ClientActiveModel, Model as ClientModel};
use crate::models::Client;

const MAX_NAME_LENGTH: usize = 200;

/// Repository for Client database operations
pub struct ClientRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ClientRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new client
    pub async fn create(&self, name: &str) -> Result<ClientModel, RepositoryError> {
        let name = validate_name(name)?;

        let client = ClientActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            created_at: Set(Utc::now().into()),
        };

        client
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ClientModel>, RepositoryError> {
        Client::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing client is an error
    pub async fn require(&self, id: Uuid) -> Result<ClientModel, RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Client {} not found", id)))
    }
}

fn validate_name(name: &str) -> Result<String, RepositoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation_error("Client name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(RepositoryError::validation_error(format!(
            "Client name cannot exceed {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}
