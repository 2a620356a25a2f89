//! Derived risk signals: deltas, participation confidence, attention lists
//! and the escalation level.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::bands::{RiskBand, band_for};
use super::thresholds::RiskThresholds;
use crate::scoring::{Domain, to_percent};

const MAX_ATTENTION_TEAMS: usize = 3;
const MAX_DOMAINS_AT_RISK: usize = 2;

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Difference between two readings, rounded to one decimal. Zero when either side is missing.
pub fn compute_delta(current: Option<f64>, previous: Option<f64>) -> f64 {
    match (current, previous) {
        (Some(current), Some(previous)) if current.is_finite() && previous.is_finite() => {
            round1(current - previous)
        }
        _ => 0.0,
    }
}

/// Composite wellbeing score on the 0-100 scale from 5-point domain averages.
///
/// Missing domains are left out and the remaining weights renormalised.
/// Returns `None` when no domain has data.
pub fn wellbeing_score<F>(five_point_average: F) -> Option<f64>
where
    F: Fn(Domain) -> Option<f64>,
{
    let mut weighted = 0.0;
    let mut weight_total = 0.0;
    for domain in Domain::ALL {
        if let Some(avg) = five_point_average(domain).filter(|v| v.is_finite()) {
            weighted += avg * domain.weight();
            weight_total += domain.weight();
        }
    }

    if weight_total > 0.0 {
        Some(to_percent(weighted / weight_total))
    } else {
        None
    }
}

/// Respondents as a percentage of eligible employees, capped at 100
pub fn participation_rate(respondents: u64, eligible: u64) -> f64 {
    if eligible == 0 {
        return 0.0;
    }
    round1((respondents as f64 / eligible as f64 * 100.0).min(100.0))
}

/// How much weight a participation rate can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Moderate,
    Low,
}

impl ConfidenceBand {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 70.0 {
            ConfidenceBand::High
        } else if rate >= 50.0 {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Composite score of one team over the window
#[derive(Debug, Clone, PartialEq)]
pub struct TeamScore {
    pub team_id: Uuid,
    pub score: f64,
    pub previous: Option<f64>,
    pub respondents: u64,
}

/// A team flagged for attention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TeamAttention {
    pub team_id: Uuid,
    pub score: f64,
    pub delta: f64,
    pub band: RiskBand,
    pub respondents: u64,
}

fn by_score(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Number of teams whose composite is below `team_attention`
pub fn count_teams_below(teams: &[TeamScore], thresholds: &RiskThresholds) -> usize {
    teams
        .iter()
        .filter(|team| team.score < thresholds.team_attention)
        .count()
}

/// Teams below `team_attention`, worst first, at most three
pub fn teams_requiring_attention(
    teams: &[TeamScore],
    thresholds: &RiskThresholds,
) -> Vec<TeamAttention> {
    let mut flagged: Vec<&TeamScore> = teams
        .iter()
        .filter(|team| team.score < thresholds.team_attention)
        .collect();
    flagged.sort_by(|a, b| by_score(&a.score, &b.score));

    flagged
        .into_iter()
        .take(MAX_ATTENTION_TEAMS)
        .map(|team| TeamAttention {
            team_id: team.team_id,
            score: round1(team.score),
            delta: compute_delta(Some(team.score), team.previous),
            band: band_for(team.score),
            respondents: team.respondents,
        })
        .collect()
}

/// A domain among the lowest scoring ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DomainRisk {
    pub domain: Domain,
    /// Domain score on the 0-100 scale
    pub score: f64,
    pub delta: f64,
    /// Whether the score is below `domain_at_risk`
    pub at_risk: bool,
}

/// The two lowest scoring domains on the 0-100 scale
pub fn domains_at_risk<C, P>(
    current: C,
    previous: P,
    thresholds: &RiskThresholds,
) -> Vec<DomainRisk>
where
    C: Fn(Domain) -> Option<f64>,
    P: Fn(Domain) -> Option<f64>,
{
    let mut scored: Vec<(Domain, f64)> = Domain::ALL
        .iter()
        .filter_map(|domain| current(*domain).map(|score| (*domain, score.clamp(0.0, 100.0))))
        .collect();
    scored.sort_by(|a, b| by_score(&a.1, &b.1));

    scored
        .into_iter()
        .take(MAX_DOMAINS_AT_RISK)
        .map(|(domain, score)| DomainRisk {
            domain,
            score: round1(score),
            delta: compute_delta(Some(score), previous(domain)),
            at_risk: score < thresholds.domain_at_risk,
        })
        .collect()
}

/// Overall escalation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum EscalationLevel {
    Low,
    Moderate,
    High,
}

impl EscalationLevel {
    /// `High` from 60 points, `Moderate` from 30
    pub fn from_points(points: u32) -> Self {
        if points >= HIGH_ESCALATION_POINTS {
            EscalationLevel::High
        } else if points >= MODERATE_ESCALATION_POINTS {
            EscalationLevel::Moderate
        } else {
            EscalationLevel::Low
        }
    }
}

const DECLINE_POINTS: u32 = 45;
const SAFETY_POINTS: u32 = 40;
const SPREAD_POINTS: u32 = 25;
const HIGH_ESCALATION_POINTS: u32 = 60;
const MODERATE_ESCALATION_POINTS: u32 = 30;

/// Escalation level with the points and reasons that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EscalationSignal {
    pub level: EscalationLevel,
    /// Sum of tripped rule points, capped at 100
    pub points: u32,
    pub reasons: Vec<String>,
}

/// Count of strictly declining steps at the end of a series
pub fn trailing_declines(series: &[f64]) -> u32 {
    series
        .windows(2)
        .rev()
        .take_while(|pair| pair[1] < pair[0])
        .count() as u32
}

/// Max minus min, when there are at least two scores
pub fn spread(scores: &[f64]) -> Option<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    (scores.len() >= 2).then_some(max - min)
}

/// Population standard deviation, when there are at least two scores
pub fn std_dev(scores: &[f64]) -> Option<f64> {
    if scores.len() < 2 {
        return None;
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

/// Combine trend, safety and team spread into an escalation signal.
///
/// Rules add points: a run of `consecutive_declines` weekly drops is 45,
/// safety under `psych_safety_critical` is 40 and a team range above
/// `range_high` is 25. The total maps onto [`EscalationLevel::from_points`].
pub fn escalation_signal(
    weekly_trend: &[f64],
    safety_score: Option<f64>,
    team_scores: &[f64],
    thresholds: &RiskThresholds,
) -> EscalationSignal {
    let mut points = 0;
    let mut reasons = Vec::new();

    let needed = thresholds.consecutive_declines;
    if needed > 0 && weekly_trend.len() >= needed as usize {
        let declines = trailing_declines(weekly_trend);
        if declines >= needed {
            points += DECLINE_POINTS;
            reasons.push(format!("{} consecutive weekly declines", declines));
        }
    }

    if let Some(safety) = safety_score
        && safety < thresholds.psych_safety_critical
    {
        points += SAFETY_POINTS;
        reasons.push(format!(
            "Psychological safety {:.1} below critical threshold {:.0}",
            safety, thresholds.psych_safety_critical
        ));
    }

    if let Some(range) = spread(team_scores)
        && range > thresholds.range_high
    {
        points += SPREAD_POINTS;
        reasons.push(format!("Team score range {:.1} exceeds {:.0}", range, thresholds.range_high));
    }

    let points = points.min(100);
    EscalationSignal {
        level: EscalationLevel::from_points(points),
        points,
        reasons,
    }
}
