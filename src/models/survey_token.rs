//! # Survey Token Model
//!
//! A token grants exactly one survey submission inside its validity window.
//! Status moves from `issued` to `consumed` once; expiry is derived from
//! `valid_until` and never written back.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "survey_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub channel: String,
    pub status: String,
    pub valid_until: DateTimeWithTimeZone,
    pub consumed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
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
    /// Effective state of the token at `now`
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.status == TokenStatus::Consumed.as_str() {
            TokenState::Consumed
        } else if self.valid_until.with_timezone(&Utc) <= now {
            TokenState::Expired
        } else {
            TokenState::Issued
        }
    }
}

/// Delivery channel the token was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenChannel {
    #[default]
    Web,
    Sms,
    Email,
}

impl TokenChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenChannel::Web => "web",
            TokenChannel::Sms => "sms",
            TokenChannel::Email => "email",
        }
    }
}

impl fmt::Display for TokenChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenChannel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "web" => Ok(TokenChannel::Web),
            "sms" => Ok(TokenChannel::Sms),
            "email" => Ok(TokenChannel::Email),
            other => Err(format!("unknown channel '{}'", other)),
        }
    }
}

/// Persisted token status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Issued,
    Consumed,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Issued => "issued",
            TokenStatus::Consumed => "consumed",
        }
    }
}

/// Token state as seen by the survey form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    Issued,
    Consumed,
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(status: TokenStatus, valid_until: DateTime<Utc>) -> Model {
        Model {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            employee_id: None,
            channel: TokenChannel::Web.as_str().to_string(),
            status: status.as_str().to_string(),
            valid_until: valid_until.into(),
            consumed_at: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn issued_token_inside_window_is_usable() {
        let now = Utc::now();
        let model = token(TokenStatus::Issued, now + Duration::days(1));
        assert_eq!(model.state_at(now), TokenState::Issued);
    }

    #[test]
    fn issued_token_past_window_is_expired() {
        let now = Utc::now();
        let model = token(TokenStatus::Issued, now - Duration::seconds(1));
        assert_eq!(model.state_at(now), TokenState::Expired);
    }

    #[test]
    fn consumed_wins_over_expiry() {
        let now = Utc::now();
        let model = token(TokenStatus::Consumed, now - Duration::days(3));
        assert_eq!(model.state_at(now), TokenState::Consumed);
    }

    #[test]
    fn channel_parses_known_values_only() {
        assert_eq!("sms".parse::<TokenChannel>(), Ok(TokenChannel::Sms));
        assert_eq!(TokenChannel::default(), TokenChannel::Web);
        assert!("fax".parse::<TokenChannel>().is_err());
    }
}
