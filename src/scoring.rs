//! # Score Mapping
//!
//! Survey answers are collected on a 3-point scale where 1 is the most
//! favourable answer. Reporting works on a 5-point scale where 5 is the most
//! favourable, so every stored answer carries both values.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// The five surveyed wellbeing domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Sentiment,
    Clarity,
    Workload,
    Safety,
    Leadership,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Sentiment,
        Domain::Clarity,
        Domain::Workload,
        Domain::Safety,
        Domain::Leadership,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Sentiment => "sentiment",
            Domain::Clarity => "clarity",
            Domain::Workload => "workload",
            Domain::Safety => "safety",
            Domain::Leadership => "leadership",
        }
    }

    /// Weight of the domain in the composite wellbeing score. Weights sum to 1.
    pub fn weight(&self) -> f64 {
        match self {
            Domain::Sentiment => 0.25,
            Domain::Workload => 0.25,
            Domain::Leadership => 0.20,
            Domain::Safety => 0.20,
            Domain::Clarity => 0.10,
        }
    }
}

/// Errors raised when validating raw survey answers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("{domain} answer must be 1, 2 or 3, got {value}")]
    AnswerOutOfRange { domain: &'static str, value: i64 },
}

/// Clamp any numeric answer onto the 3-point scale.
///
/// Values at or below 1 become 1, values at or above 3 become 3 and anything
/// in between (including NaN) becomes 2.
pub fn clamp_answer(value: f64) -> u8 {
    if value <= 1.0 {
        1
    } else if value >= 3.0 {
        3
    } else {
        2
    }
}

/// Map a 3-point answer to the 5-point scale: 1 to 5, 2 to 3, 3 to 1.
pub fn map_3_to_5(answer: u8) -> u8 {
    match clamp_answer(f64::from(answer)) {
        1 => 5,
        2 => 3,
        _ => 1,
    }
}

/// Raw answers as submitted on the 3-point scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ThreePointAnswers {
    pub sentiment: u8,
    pub clarity: u8,
    pub workload: u8,
    pub safety: u8,
    pub leadership: u8,
}

/// Answers converted to the 5-point reporting scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FivePointAnswers {
    pub sentiment: u8,
    pub clarity: u8,
    pub workload: u8,
    pub safety: u8,
    pub leadership: u8,
}

impl ThreePointAnswers {
    /// Build from untrusted integers, rejecting anything outside 1..=3.
    pub fn try_new(
        sentiment: i64,
        clarity: i64,
        workload: i64,
        safety: i64,
        leadership: i64,
    ) -> Result<Self, ScoringError> {
        Ok(Self {
            sentiment: checked_answer(Domain::Sentiment, sentiment)?,
            clarity: checked_answer(Domain::Clarity, clarity)?,
            workload: checked_answer(Domain::Workload, workload)?,
            safety: checked_answer(Domain::Safety, safety)?,
            leadership: checked_answer(Domain::Leadership, leadership)?,
        })
    }

    pub fn get(&self, domain: Domain) -> u8 {
        match domain {
            Domain::Sentiment => self.sentiment,
            Domain::Clarity => self.clarity,
            Domain::Workload => self.workload,
            Domain::Safety => self.safety,
            Domain::Leadership => self.leadership,
        }
    }

    pub fn to_five_point(&self) -> FivePointAnswers {
        FivePointAnswers {
            sentiment: map_3_to_5(self.sentiment),
            clarity: map_3_to_5(self.clarity),
            workload: map_3_to_5(self.workload),
            safety: map_3_to_5(self.safety),
            leadership: map_3_to_5(self.leadership),
        }
    }
}

impl FivePointAnswers {
    pub fn get(&self, domain: Domain) -> u8 {
        match domain {
            Domain::Sentiment => self.sentiment,
            Domain::Clarity => self.clarity,
            Domain::Workload => self.workload,
            Domain::Safety => self.safety,
            Domain::Leadership => self.leadership,
        }
    }
}

fn checked_answer(domain: Domain, value: i64) -> Result<u8, ScoringError> {
    match value {
        1..=3 => Ok(value as u8),
        _ => Err(ScoringError::AnswerOutOfRange {
            domain: domain.as_str(),
            value,
        }),
    }
}

/// Convert a 5-point average onto the 0-100 reporting scale.
pub fn to_percent(five_point: f64) -> f64 {
    (five_point * 20.0).clamp(0.0, 100.0)
}
