//! Band classification for composite scores on the 0-100 scale.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fine-grained risk band used for textual interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Elevated,
    Emerging,
    WithinTolerance,
    Low,
}

impl RiskBand {
    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::Low => "Low risk",
            RiskBand::WithinTolerance => "Within tolerance",
            RiskBand::Emerging => "Emerging risk",
            RiskBand::Elevated => "Elevated risk",
        }
    }

    /// Tone for narrative copy
    pub fn tone(&self) -> &'static str {
        match self {
            RiskBand::Low | RiskBand::WithinTolerance => "calm",
            RiskBand::Emerging => "cautious",
            RiskBand::Elevated => "urgent",
        }
    }

    pub fn visual(&self) -> VisualBand {
        match self {
            RiskBand::Low | RiskBand::WithinTolerance => VisualBand::Ok,
            RiskBand::Emerging => VisualBand::Warn,
            RiskBand::Elevated => VisualBand::Risk,
        }
    }
}

/// Coarse band tag used for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VisualBand {
    Risk,
    Warn,
    Ok,
}

/// Result of classifying a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BandClassification {
    /// Score after clamping to 0-100
    pub score: f64,
    pub band: RiskBand,
    pub label: String,
    pub tone: String,
    pub visual: VisualBand,
}

/// Clamp a score to 0-100. Non-finite input is treated as 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Band for a score. Boundary values belong to the higher band.
pub fn band_for(score: f64) -> RiskBand {
    let score = clamp_score(score);
    if score >= 80.0 {
        RiskBand::Low
    } else if score >= 70.0 {
        RiskBand::WithinTolerance
    } else if score >= 60.0 {
        RiskBand::Emerging
    } else {
        RiskBand::Elevated
    }
}

/// Clamp then classify a score
pub fn classify(score: f64) -> BandClassification {
    let score = clamp_score(score);
    let band = band_for(score);
    BandClassification {
        score,
        band,
        label: band.label().to_string(),
        tone: band.tone().to_string(),
        visual: band.visual(),
    }
}
