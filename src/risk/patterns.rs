//! Per-domain operational risk: persistence, pattern, status and the
//! priority ranking used to pick which domains to act on first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::signals::{TeamScore, compute_delta, count_teams_below, round1};
use super::thresholds::RiskThresholds;
use crate::scoring::Domain;

/// Persistence needed before a pattern counts as sustained
const SUSTAINED_PERSISTENCE: u8 = 2;
/// Share of teams below attention, in percent, that makes a pattern systemic
const SYSTEMIC_TEAMS_PCT: f64 = 30.0;
/// Drop that marks a fresh deterioration
const EMERGING_DROP: f64 = -10.0;
/// Swing that marks a volatile domain when nothing persists
const VOLATILITY: f64 = 10.0;
/// Domain delta that saturates the trend component of the priority
const TREND_SCALE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DomainPattern {
    #[serde(rename = "Systemic decline")]
    SystemicDecline,
    #[serde(rename = "Localised persistent")]
    LocalisedPersistent,
    #[serde(rename = "Emerging deterioration")]
    EmergingDeterioration,
    #[serde(rename = "Volatile")]
    Volatile,
    #[serde(rename = "Stable")]
    Stable,
}

impl DomainPattern {
    fn rank(self) -> u8 {
        match self {
            DomainPattern::SystemicDecline => 3,
            DomainPattern::EmergingDeterioration => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    Elevated,
    Watch,
    Low,
}

impl DomainStatus {
    /// `Elevated` below `below_tolerance`, `Watch` below `domain_at_risk`
    pub fn for_score(score: f64, thresholds: &RiskThresholds) -> Self {
        if score < thresholds.below_tolerance {
            DomainStatus::Elevated
        } else if score < thresholds.domain_at_risk {
            DomainStatus::Watch
        } else {
            DomainStatus::Low
        }
    }
}

/// 2 when this and the previous period are below tolerance, 1 when only
/// this one is, 0 otherwise
pub fn persistence(current: f64, previous: Option<f64>, thresholds: &RiskThresholds) -> u8 {
    let below = |score: f64| score < thresholds.below_tolerance;
    match (below(current), previous.is_some_and(below)) {
        (true, true) => 2,
        (true, false) => 1,
        _ => 0,
    }
}

/// First matching rule wins: systemic, localised, emerging, volatile
pub fn assign_pattern(delta: f64, persistence: u8, teams_below: usize, total_teams: usize) -> DomainPattern {
    let breadth = if total_teams > 0 {
        teams_below as f64 / total_teams as f64 * 100.0
    } else {
        0.0
    };

    if persistence >= SUSTAINED_PERSISTENCE {
        if breadth >= SYSTEMIC_TEAMS_PCT {
            DomainPattern::SystemicDecline
        } else {
            DomainPattern::LocalisedPersistent
        }
    } else if delta <= EMERGING_DROP && persistence == 1 {
        DomainPattern::EmergingDeterioration
    } else if delta.abs() > VOLATILITY && persistence == 0 {
        DomainPattern::Volatile
    } else {
        DomainPattern::Stable
    }
}

/// One row of the operational risk table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DomainRiskRow {
    pub domain: Domain,
    pub score: f64,
    pub delta: f64,
    pub teams_below: usize,
    pub total_teams: usize,
    pub persistence: u8,
    pub pattern: DomainPattern,
    pub status: DomainStatus,
}

/// Risk table over every domain with data.
///
/// Systemic declines sort first, then emerging deteriorations, then the
/// rest; ties go lowest score first.
pub fn domain_risk_table<C, P>(
    current: C,
    previous: P,
    teams: &[TeamScore],
    thresholds: &RiskThresholds,
) -> Vec<DomainRiskRow>
where
    C: Fn(Domain) -> Option<f64>,
    P: Fn(Domain) -> Option<f64>,
{
    let total_teams = teams.len();
    let teams_below = count_teams_below(teams, thresholds);

    let mut rows: Vec<DomainRiskRow> = Domain::ALL
        .iter()
        .filter_map(|domain| {
            let score = current(*domain)?.clamp(0.0, 100.0);
            let before = previous(*domain);
            let delta = compute_delta(Some(score), before);
            let persistence = persistence(score, before, thresholds);
            Some(DomainRiskRow {
                domain: *domain,
                score: round1(score),
                delta,
                teams_below,
                total_teams,
                persistence,
                pattern: assign_pattern(delta, persistence, teams_below, total_teams),
                status: DomainStatus::for_score(score, thresholds),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.pattern
            .rank()
            .cmp(&a.pattern.rank())
            .then(a.score.total_cmp(&b.score))
    });
    rows
}

/// A domain's place in the action ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DomainPriority {
    pub domain: Domain,
    pub score: f64,
    pub delta: f64,
    /// 0.55 severity + 0.35 trend + 0.10 team spread, each in 0-1
    pub priority: f64,
    pub why: String,
}

/// Rank domains by how urgently they need action, highest first.
///
/// Severity is the distance below `domain_at_risk`, trend the size of a
/// drop and spread the range of team scores for the domain relative to
/// `range_high`.
pub fn domain_priority<C, P>(
    current: C,
    previous: P,
    spread_by_domain: &BTreeMap<Domain, f64>,
    thresholds: &RiskThresholds,
) -> Vec<DomainPriority>
where
    C: Fn(Domain) -> Option<f64>,
    P: Fn(Domain) -> Option<f64>,
{
    let at_risk = thresholds.domain_at_risk;
    let mut ranked: Vec<DomainPriority> = Domain::ALL
        .iter()
        .filter_map(|domain| {
            let score = current(*domain)?.clamp(0.0, 100.0);
            let delta = compute_delta(Some(score), previous(*domain));
            let below = score < at_risk;
            let declining = delta < 0.0;

            let severity = if below && at_risk > 0.0 {
                ((at_risk - score) / at_risk).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let trend = if declining {
                (-delta / TREND_SCALE).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let spread = match spread_by_domain.get(domain) {
                Some(range) if thresholds.range_high > 0.0 => {
                    (range / thresholds.range_high).clamp(0.0, 1.0)
                }
                _ => 0.0,
            };

            let why = match (below, declining) {
                (true, true) => "Below tolerance and declining",
                (true, false) => "Below tolerance",
                (false, true) => "Declining",
                (false, false) => "Monitor",
            };

            let priority = 0.55 * severity + 0.35 * trend + 0.10 * spread;
            Some(DomainPriority {
                domain: *domain,
                score: round1(score),
                delta,
                priority: (priority * 1000.0).round() / 1000.0,
                why: why.to_string(),
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn teams(scores: &[f64]) -> Vec<TeamScore> {
        scores
            .iter()
            .map(|score| TeamScore {
                team_id: Uuid::new_v4(),
                score: *score,
                previous: None,
                respondents: 3,
            })
            .collect()
    }

    #[test]
    fn persistence_looks_one_period_back() {
        let t = RiskThresholds::default();
        assert_eq!(persistence(50.0, Some(55.0), &t), 2);
        assert_eq!(persistence(50.0, Some(65.0), &t), 1);
        assert_eq!(persistence(50.0, None, &t), 1);
        assert_eq!(persistence(65.0, Some(40.0), &t), 0);
    }

    #[test]
    fn pattern_rules_in_order() {
        // one of three teams below attention is 33%
        assert_eq!(assign_pattern(-2.0, 2, 1, 3), DomainPattern::SystemicDecline);
        assert_eq!(assign_pattern(-2.0, 2, 1, 4), DomainPattern::LocalisedPersistent);
        assert_eq!(assign_pattern(0.0, 2, 0, 0), DomainPattern::LocalisedPersistent);
        assert_eq!(assign_pattern(-10.0, 1, 3, 3), DomainPattern::EmergingDeterioration);
        assert_eq!(assign_pattern(-9.9, 1, 0, 3), DomainPattern::Stable);
        assert_eq!(assign_pattern(12.0, 0, 0, 3), DomainPattern::Volatile);
        assert_eq!(assign_pattern(-12.0, 0, 0, 3), DomainPattern::Volatile);
        assert_eq!(assign_pattern(10.0, 0, 0, 3), DomainPattern::Stable);
        assert_eq!(assign_pattern(15.0, 1, 0, 3), DomainPattern::Stable);
    }

    #[test]
    fn status_uses_tolerance_then_at_risk() {
        let t = RiskThresholds::default();
        assert_eq!(DomainStatus::for_score(59.9, &t), DomainStatus::Elevated);
        assert_eq!(DomainStatus::for_score(60.0, &t), DomainStatus::Watch);
        assert_eq!(DomainStatus::for_score(70.0, &t), DomainStatus::Low);
    }

    #[test]
    fn table_sorts_systemic_then_emerging_then_score() {
        let current = |d: Domain| match d {
            Domain::Safety => Some(40.0),
            Domain::Workload => Some(55.0),
            Domain::Leadership => Some(58.0),
            Domain::Clarity => Some(90.0),
            Domain::Sentiment => None,
        };
        let previous = |d: Domain| match d {
            Domain::Safety => Some(45.0),
            Domain::Workload => Some(70.0),
            Domain::Leadership => Some(61.0),
            Domain::Clarity => Some(75.0),
            Domain::Sentiment => None,
        };
        let rows = domain_risk_table(
            current,
            previous,
            &teams(&[40.0, 80.0, 75.0]),
            &RiskThresholds::default(),
        );

        let order: Vec<(Domain, DomainPattern)> = rows.iter().map(|r| (r.domain, r.pattern)).collect();
        assert_eq!(
            order,
            vec![
                (Domain::Safety, DomainPattern::SystemicDecline),
                (Domain::Workload, DomainPattern::EmergingDeterioration),
                (Domain::Leadership, DomainPattern::Stable),
                (Domain::Clarity, DomainPattern::Volatile),
            ]
        );
        assert_eq!(rows[0].teams_below, 1);
        assert_eq!(rows[0].total_teams, 3);
        assert_eq!(rows[0].persistence, 2);
        assert_eq!(rows[0].status, DomainStatus::Elevated);
        assert_eq!(rows[1].delta, -15.0);
        assert_eq!(rows[3].status, DomainStatus::Low);
    }

    #[test]
    fn priority_weights_severity_trend_and_spread() {
        let current = |d: Domain| match d {
            Domain::Safety => Some(35.0),
            Domain::Workload => Some(80.0),
            Domain::Clarity => Some(65.0),
            _ => Some(90.0),
        };
        let previous = |d: Domain| match d {
            Domain::Safety => Some(45.0),
            Domain::Workload => Some(90.0),
            _ => None,
        };
        let spread = BTreeMap::from([(Domain::Clarity, 45.0)]);
        let ranked = domain_priority(current, previous, &spread, &RiskThresholds::default());

        assert_eq!(ranked.len(), 5);
        let safety = &ranked[0];
        assert_eq!(safety.domain, Domain::Safety);
        // 0.55 * 0.5 + 0.35 * 0.5
        assert!((safety.priority - 0.45).abs() < 1e-9);
        assert_eq!(safety.why, "Below tolerance and declining");

        let workload = &ranked[1];
        assert_eq!(workload.domain, Domain::Workload);
        assert_eq!(workload.why, "Declining");
        assert!((workload.priority - 0.175).abs() < 1e-9);

        // severity 5/70 plus a saturated spread
        let clarity = &ranked[2];
        assert_eq!(clarity.domain, Domain::Clarity);
        assert_eq!(clarity.why, "Below tolerance");
        assert!((clarity.priority - 0.139).abs() < 1e-9);

        assert_eq!(ranked[4].why, "Monitor");
        assert_eq!(ranked[4].priority, 0.0);
    }
}
