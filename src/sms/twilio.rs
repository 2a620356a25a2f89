//! Twilio Messages API client.

use std::time::Duration;

use metrics::counter;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::SmsError;
use crate::config::TwilioConfig;

/// Identifiers Twilio returns for an accepted message
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SmsReceipt {
    pub sid: Option<String>,
    pub status: Option<String>,
}

/// Thin client over `POST /2010-04-01/Accounts/{sid}/Messages.json`
#[derive(Debug, Clone)]
pub struct TwilioClient {
    client: Client,
    config: TwilioConfig,
}

impl TwilioClient {
    pub fn new(config: TwilioConfig) -> Result<Self, SmsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    /// Names of credentials that are not set
    pub fn missing_configuration(&self) -> Vec<String> {
        self.config.missing()
    }

    /// Fail with [`SmsError::NotConfigured`] unless all credentials are present
    pub fn ensure_configured(&self) -> Result<(), SmsError> {
        let missing = self.missing_configuration();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SmsError::NotConfigured { missing })
        }
    }

    /// Send one message. No retries; the caller decides what a failure means.
    pub async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        self.ensure_configured()?;

        let (Some(sid), Some(token), Some(from)) = (
            self.config.account_sid.as_deref(),
            self.config.auth_token.as_deref(),
            self.config.from_number.as_deref(),
        ) else {
            return Err(SmsError::NotConfigured {
                missing: self.missing_configuration(),
            });
        };

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(sid, Some(token))
            .form(&[("To", to), ("From", from), ("Body", body)])
            .send()
            .await
            .inspect_err(|_| {
                counter!("beacon_sms_failed_total", "reason" => "network").increment(1);
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.ok().filter(|t| !t.is_empty());
            warn!(status = status.as_u16(), "Twilio rejected message");
            counter!("beacon_sms_failed_total", "reason" => "provider").increment(1);
            return Err(SmsError::Provider {
                status: status.as_u16(),
                body: text,
            });
        }

        let receipt: SmsReceipt = response.json().await.unwrap_or_default();
        counter!("beacon_sms_sent_total").increment(1);
        info!(sid = ?receipt.sid, "SMS accepted by Twilio");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_fails_before_network() {
        let client = TwilioClient::new(TwilioConfig {
            account_sid: Some("AC123".to_string()),
            auth_token: None,
            from_number: None,
            ..TwilioConfig::default()
        })
        .unwrap();

        let err = client.send("+61412345678", "hello").await.unwrap_err();
        match err {
            SmsError::NotConfigured { missing } => {
                assert_eq!(
                    missing,
                    vec![
                        "BEACON_TWILIO_AUTH_TOKEN".to_string(),
                        "BEACON_TWILIO_FROM_NUMBER".to_string()
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
