//! # Risk Classification
//!
//! Pure functions that turn aggregated scores into bands, flags and
//! escalation signals, driven by per-client [`RiskThresholds`].

pub mod bands;
pub mod patterns;
pub mod signals;
pub mod thresholds;

pub use bands::{BandClassification, RiskBand, VisualBand, classify};
pub use patterns::{DomainPattern, DomainPriority, DomainRiskRow, DomainStatus};
pub use signals::{
    ConfidenceBand, DomainRisk, EscalationLevel, EscalationSignal, TeamAttention, TeamScore,
};
pub use thresholds::RiskThresholds;
