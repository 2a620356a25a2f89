//! Per-client risk thresholds with documented defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

/// Seven numeric knobs controlling flags, risk patterns and escalation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RiskThresholds {
    /// Team composite below this needs attention
    #[schema(example = 60.0)]
    pub team_attention: f64,
    /// Overall wellbeing below this is outside tolerance
    #[schema(example = 60.0)]
    pub below_tolerance: f64,
    /// Domain score below this is at risk
    #[schema(example = 70.0)]
    pub domain_at_risk: f64,
    /// Psychological safety score below this is critical
    #[schema(example = 50.0)]
    pub psych_safety_critical: f64,
    /// Trailing weekly declines that trigger escalation
    #[schema(example = 3)]
    pub consecutive_declines: u32,
    /// Max minus min team score above this is a spread flag
    #[schema(example = 30.0)]
    pub range_high: f64,
    /// Team score standard deviation above this marks uneven exposure
    #[schema(example = 12.0)]
    pub variance_high: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            team_attention: 60.0,
            below_tolerance: 60.0,
            domain_at_risk: 70.0,
            psych_safety_critical: 50.0,
            consecutive_declines: 3,
            range_high: 30.0,
            variance_high: 12.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

impl RiskThresholds {
    /// Merge a stored override object over `self` key by key.
    ///
    /// Unknown keys and non-numeric values are ignored, so a partially
    /// malformed override still applies its valid entries.
    pub fn with_overrides(mut self, overrides: &Value) -> Self {
        let Some(map) = overrides.as_object() else {
            return self;
        };

        let number = |key: &str| map.get(key).and_then(Value::as_f64).filter(|v| v.is_finite());

        if let Some(v) = number("team_attention") {
            self.team_attention = v;
        }
        if let Some(v) = number("below_tolerance") {
            self.below_tolerance = v;
        }
        if let Some(v) = number("domain_at_risk") {
            self.domain_at_risk = v;
        }
        if let Some(v) = number("psych_safety_critical") {
            self.psych_safety_critical = v;
        }
        if let Some(v) = number("consecutive_declines").filter(|v| *v >= 0.0) {
            self.consecutive_declines = v.round() as u32;
        }
        if let Some(v) = number("range_high") {
            self.range_high = v;
        }
        if let Some(v) = number("variance_high") {
            self.variance_high = v;
        }
        self
    }

    /// Bounds check applied before overrides are stored
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let percent_fields = [
            ("team_attention", self.team_attention),
            ("below_tolerance", self.below_tolerance),
            ("domain_at_risk", self.domain_at_risk),
            ("psych_safety_critical", self.psych_safety_critical),
            ("range_high", self.range_high),
            ("variance_high", self.variance_high),
        ];
        for (field, value) in percent_fields {
            if !(0.0..=100.0).contains(&value) {
                return Err(ThresholdError::OutOfRange {
                    field,
                    min: 0.0,
                    max: 100.0,
                    value,
                });
            }
        }

        if !(1..=52).contains(&self.consecutive_declines) {
            return Err(ThresholdError::OutOfRange {
                field: "consecutive_declines",
                min: 1.0,
                max: 52.0,
                value: f64::from(self.consecutive_declines),
            });
        }

        Ok(())
    }
}
