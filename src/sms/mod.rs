//! # SMS Delivery
//!
//! Outbound survey links go through the Twilio Messages API. Credentials are
//! checked before any work starts so a half-configured deployment fails
//! closed instead of issuing tokens it cannot deliver.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

mod twilio;

pub use twilio::{SmsReceipt, TwilioClient};

/// Body used when a batch does not supply its own template
pub const DEFAULT_TEMPLATE: &str = "Your weekly check-in: {{link}}";

const LINK_PLACEHOLDER: &str = "{{link}}";
const NAME_PLACEHOLDER: &str = "{{first_name}}";

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS delivery is not configured; missing {}", missing.join(", "))]
    NotConfigured { missing: Vec<String> },
    #[error("invalid phone number '{phone}'")]
    InvalidPhone { phone: String },
    #[error("SMS provider returned status {status}")]
    Provider { status: u16, body: Option<String> },
    #[error("SMS provider request failed: {0}")]
    Network(#[from] reqwest::Error),
}

fn e164_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+[1-9]\d{7,14}$").expect("valid E.164 pattern"))
}

fn au_mobile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+61\d{9}$").expect("valid AU mobile pattern"))
}

/// Strip common formatting characters from a phone number
pub fn normalise_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect()
}

/// Normalise and validate an E.164 number
pub fn validate_e164(raw: &str) -> Result<String, SmsError> {
    let phone = normalise_phone(raw);
    if e164_pattern().is_match(&phone) {
        Ok(phone)
    } else {
        Err(SmsError::InvalidPhone {
            phone: raw.to_string(),
        })
    }
}

/// Test sends are restricted to Australian mobiles (`+61` and nine digits)
pub fn validate_test_number(raw: &str) -> Result<String, SmsError> {
    let phone = normalise_phone(raw);
    if au_mobile_pattern().is_match(&phone) {
        Ok(phone)
    } else {
        Err(SmsError::InvalidPhone {
            phone: raw.to_string(),
        })
    }
}

/// Render a message template for one recipient.
///
/// `{{link}}` is replaced with the survey URL; a template without the
/// placeholder gets the link appended. `{{first_name}}` falls back to "there".
pub fn render_message(template: Option<&str>, link: &str, first_name: Option<&str>) -> String {
    let template = template
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TEMPLATE);

    let name = first_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("there");

    let body = template.replace(NAME_PLACEHOLDER, name);
    if body.contains(LINK_PLACEHOLDER) {
        body.replace(LINK_PLACEHOLDER, link)
    } else {
        format!("{}\n{}", body, link)
    }
}

/// Prefix a rendered body with the configured sender name, if any
pub fn with_sender(sender: Option<&str>, body: String) -> String {
    match sender.map(str::trim).filter(|s| !s.is_empty()) {
        Some(sender) => format!("{}: {}", sender, body),
        None => body,
    }
}
