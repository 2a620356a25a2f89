//! # Client Config Repository
//!
//! Reads and writes per-client risk threshold overrides. Resolution never
//! fails: any problem reading the override falls back to the defaults.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::ClientConfig;
use crate::models::client_config::{ActiveModel as ClientConfigActiveModel, Model as ClientConfigModel};
use crate::risk::RiskThresholds;

const THRESHOLD_KEYS: [&str; 7] = [
    "team_attention",
    "below_tolerance",
    "domain_at_risk",
    "psych_safety_critical",
    "consecutive_declines",
    "range_high",
    "variance_high",
];

/// Repository for client configuration
pub struct ClientConfigRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ClientConfigRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, client_id: Uuid) -> Result<Option<ClientConfigModel>, RepositoryError> {
        ClientConfig::find_by_id(client_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Thresholds for a client, merged over the defaults.
    pub async fn resolve_thresholds(&self, client_id: Uuid) -> RiskThresholds {
        match self.find(client_id).await {
            Ok(Some(config)) => config.thresholds(),
            Ok(None) => RiskThresholds::default(),
            Err(error) => {
                tracing::warn!(
                    client_id = %client_id,
                    error = %error,
                    "Failed to load risk thresholds, using defaults"
                );
                RiskThresholds::default()
            }
        }
    }

    /// Merge `overrides` into the stored override object and return the
    /// resolved thresholds. Unknown keys are rejected, as is any result
    /// outside the allowed ranges.
    pub async fn upsert_overrides(
        &self,
        client_id: Uuid,
        overrides: &Map<String, Value>,
    ) -> Result<RiskThresholds, RepositoryError> {
        if let Some(unknown) = overrides.keys().find(|k| !THRESHOLD_KEYS.contains(&k.as_str())) {
            return Err(RepositoryError::validation_error(format!(
                "Unknown threshold '{}'",
                unknown
            )));
        }
        if let Some((key, _)) = overrides.iter().find(|(_, v)| !v.is_number()) {
            return Err(RepositoryError::validation_error(format!(
                "Threshold '{}' must be a number",
                key
            )));
        }

        let existing = self.find(client_id).await?;
        let mut merged = existing
            .as_ref()
            .and_then(|config| config.risk_thresholds.as_ref())
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        merged.retain(|key, _| THRESHOLD_KEYS.contains(&key.as_str()));
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

        let merged = Value::Object(merged);
        let thresholds = RiskThresholds::default().with_overrides(&merged);
        thresholds
            .validate()
            .map_err(|error| RepositoryError::validation_error(error.to_string()))?;

        let now = Utc::now();
        match existing {
            Some(config) => {
                let mut active = config.into_active_model();
                active.risk_thresholds = Set(Some(merged));
                active.updated_at = Set(now.into());
                active
                    .update(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;
            }
            None => {
                ClientConfigActiveModel {
                    client_id: Set(client_id),
                    risk_thresholds: Set(Some(merged)),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                }
                .insert(self.db)
                .await
                .map_err(RepositoryError::database_error)?;
            }
        }

        tracing::info!(client_id = %client_id, "Updated risk threshold overrides");
        Ok(thresholds)
    }
}
