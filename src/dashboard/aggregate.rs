//! Folding filtered response rows into dashboard figures.
//!
//! Rows arrive already filtered by client, window and org scope and ordered
//! by `submitted_at`. Everything here is a single pass plus small per-week
//! and per-team maps.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::survey_response::Model as ResponseModel;
use crate::risk::signals::{
    ConfidenceBand, DomainRisk, EscalationSignal, TeamAttention, TeamScore, compute_delta,
    count_teams_below, domains_at_risk, escalation_signal, participation_rate, round1, spread,
    std_dev, teams_requiring_attention, wellbeing_score,
};
use crate::risk::patterns::{DomainPriority, DomainRiskRow, domain_priority, domain_risk_table};
use crate::risk::{BandClassification, RiskThresholds, classify};
use crate::scoring::{Domain, to_percent};

/// Running sums of 5-point answers per domain. Null answers are skipped.
#[derive(Debug, Clone, Default)]
struct DomainTotals {
    totals: BTreeMap<Domain, (i64, u64)>,
    responses: u64,
}

impl DomainTotals {
    fn add(&mut self, row: &ResponseModel) {
        self.responses += 1;
        for domain in Domain::ALL {
            if let Some(value) = row.five_point(domain) {
                let entry = self.totals.entry(domain).or_default();
                entry.0 += i64::from(value);
                entry.1 += 1;
            }
        }
    }

    fn average(&self, domain: Domain) -> Option<f64> {
        self.totals
            .get(&domain)
            .filter(|(_, count)| *count > 0)
            .map(|(sum, count)| *sum as f64 / *count as f64)
    }

    fn score(&self, domain: Domain) -> Option<f64> {
        self.average(domain).map(to_percent)
    }

    fn wellbeing(&self) -> Option<f64> {
        wellbeing_score(|domain| self.average(domain))
    }
}

/// Average for one domain over the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DomainSummary {
    pub domain: Domain,
    /// Mean of the 5-point values, one decimal
    pub average: Option<f64>,
    /// Average on the 0-100 scale
    pub score: Option<f64>,
    /// Change between the last two weekly buckets
    pub delta: f64,
    /// Responses that answered this domain
    pub answered: u64,
}

/// One ISO week (Monday start, UTC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyBucket {
    pub week_start: NaiveDate,
    pub responses: u64,
    pub wellbeing: Option<f64>,
    pub domains: BTreeMap<Domain, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Participation {
    pub respondents: u64,
    pub eligible: u64,
    /// Percentage, capped at 100
    pub rate: f64,
    pub confidence: ConfidenceBand,
}

/// Everything the dashboard derives from a set of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardAggregates {
    pub total_responses: u64,
    pub wellbeing_score: Option<f64>,
    pub wellbeing_delta: f64,
    pub band: Option<BandClassification>,
    /// Wellbeing below `below_tolerance`
    pub below_tolerance: bool,
    pub domains: Vec<DomainSummary>,
    pub trend: Vec<WeeklyBucket>,
    pub participation: Participation,
    pub teams_below_threshold: usize,
    pub teams_requiring_attention: Vec<TeamAttention>,
    pub domains_at_risk: Vec<DomainRisk>,
    /// Operational risk per domain, most urgent pattern first
    pub domain_risk: Vec<DomainRiskRow>,
    /// Domains ranked by action priority
    pub domain_priority: Vec<DomainPriority>,
    /// Standard deviation of team composites
    pub team_deviation: Option<f64>,
    /// Team deviation above `variance_high`
    pub uneven_exposure: bool,
    pub escalation: EscalationSignal,
    pub support_requests: u64,
    pub high_risk_flags: u64,
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Distinct known employees plus every anonymous row
pub fn count_respondents<'a, I>(rows: I) -> u64
where
    I: IntoIterator<Item = &'a ResponseModel>,
{
    let mut employees = HashSet::new();
    let mut anonymous = 0u64;
    for row in rows {
        match row.employee_id {
            Some(id) => {
                employees.insert(id);
            }
            None => anonymous += 1,
        }
    }
    employees.len() as u64 + anonymous
}

/// Fold rows into dashboard aggregates
pub fn aggregate(
    rows: &[ResponseModel],
    eligible: u64,
    thresholds: &RiskThresholds,
) -> DashboardAggregates {
    let mut overall = DomainTotals::default();
    let mut weeks: BTreeMap<NaiveDate, DomainTotals> = BTreeMap::new();
    let mut teams: HashMap<Uuid, DomainTotals> = HashMap::new();
    let mut support_requests = 0;
    let mut high_risk_flags = 0;

    for row in rows {
        overall.add(row);
        let week = week_start(row.submitted_at.with_timezone(&Utc).date_naive());
        weeks.entry(week).or_default().add(row);
        if let Some(team_id) = row.team_id {
            teams.entry(team_id).or_default().add(row);
        }
        if row.support_requested {
            support_requests += 1;
        }
        if row.high_risk_flag {
            high_risk_flags += 1;
        }
    }

    let latest_week = weeks.keys().next_back().copied();
    let mut recent = weeks.values().rev();
    let last_bucket = recent.next();
    let previous_bucket = recent.next();

    let domains = Domain::ALL
        .iter()
        .map(|domain| DomainSummary {
            domain: *domain,
            average: overall.average(*domain).map(round1),
            score: overall.score(*domain).map(round1),
            delta: compute_delta(
                last_bucket.and_then(|b| b.score(*domain)),
                previous_bucket.and_then(|b| b.score(*domain)),
            ),
            answered: overall.totals.get(domain).map_or(0, |(_, count)| *count),
        })
        .collect();

    let trend: Vec<WeeklyBucket> = weeks
        .iter()
        .map(|(week, totals)| WeeklyBucket {
            week_start: *week,
            responses: totals.responses,
            wellbeing: totals.wellbeing().map(round1),
            domains: Domain::ALL
                .iter()
                .filter_map(|d| totals.average(*d).map(|avg| (*d, round1(avg))))
                .collect(),
        })
        .collect();

    let team_scores = team_scores(rows, &teams, latest_week);
    let composites: Vec<f64> = team_scores.iter().map(|team| team.score).collect();
    let weekly_wellbeing: Vec<f64> = weeks.values().filter_map(DomainTotals::wellbeing).collect();
    let team_deviation = std_dev(&composites);
    let spread_by_domain: BTreeMap<Domain, f64> = Domain::ALL
        .iter()
        .filter_map(|domain| {
            let per_team: Vec<f64> = teams.values().filter_map(|t| t.score(*domain)).collect();
            spread(&per_team).map(|range| (*domain, range))
        })
        .collect();
    let previous_score = |domain: Domain| previous_bucket.and_then(|b| b.score(domain));

    let wellbeing = overall.wellbeing();
    let respondents = count_respondents(rows);
    let rate = participation_rate(respondents, eligible);

    DashboardAggregates {
        total_responses: overall.responses,
        wellbeing_score: wellbeing.map(round1),
        wellbeing_delta: compute_delta(
            last_bucket.and_then(DomainTotals::wellbeing),
            previous_bucket.and_then(DomainTotals::wellbeing),
        ),
        band: wellbeing.map(classify),
        below_tolerance: wellbeing.is_some_and(|score| score < thresholds.below_tolerance),
        domains,
        trend,
        participation: Participation {
            respondents,
            eligible,
            rate,
            confidence: ConfidenceBand::from_rate(rate),
        },
        teams_below_threshold: count_teams_below(&team_scores, thresholds),
        teams_requiring_attention: teams_requiring_attention(&team_scores, thresholds),
        domains_at_risk: domains_at_risk(|domain| overall.score(domain), previous_score, thresholds),
        domain_risk: domain_risk_table(
            |domain| overall.score(domain),
            previous_score,
            &team_scores,
            thresholds,
        ),
        domain_priority: domain_priority(
            |domain| overall.score(domain),
            previous_score,
            &spread_by_domain,
            thresholds,
        ),
        team_deviation: team_deviation.map(round1),
        uneven_exposure: team_deviation.is_some_and(|dev| dev > thresholds.variance_high),
        escalation: escalation_signal(
            &weekly_wellbeing,
            overall.score(Domain::Safety),
            &composites,
            thresholds,
        ),
        support_requests,
        high_risk_flags,
    }
}

/// Team composites over the window. `previous` covers the team's rows
/// submitted before the latest weekly bucket.
fn team_scores(
    rows: &[ResponseModel],
    teams: &HashMap<Uuid, DomainTotals>,
    latest_week: Option<NaiveDate>,
) -> Vec<TeamScore> {
    let mut earlier: HashMap<Uuid, DomainTotals> = HashMap::new();
    let mut members: HashMap<Uuid, Vec<&ResponseModel>> = HashMap::new();
    for row in rows {
        let Some(team_id) = row.team_id else { continue };
        members.entry(team_id).or_default().push(row);
        if let Some(latest) = latest_week
            && row.submitted_at.with_timezone(&Utc).date_naive() < latest
        {
            earlier.entry(team_id).or_default().add(row);
        }
    }

    let mut scores: Vec<TeamScore> = teams
        .iter()
        .filter_map(|(team_id, totals)| {
            let score = totals.wellbeing()?;
            let respondents = members
                .get(team_id)
                .map_or(0, |rows| count_respondents(rows.iter().copied()));
            Some(TeamScore {
                team_id: *team_id,
                score,
                previous: earlier.get(team_id).and_then(DomainTotals::wellbeing),
                respondents,
            })
        })
        .collect();
    scores.sort_by_key(|team| team.team_id);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::patterns::{DomainPattern, DomainStatus};
    use crate::risk::{EscalationLevel, RiskBand};
    use chrono::{DateTime, TimeZone};

    fn row(
        submitted_at: DateTime<Utc>,
        answer_3: i32,
        employee_id: Option<Uuid>,
        team_id: Option<Uuid>,
    ) -> ResponseModel {
        let five = i32::from(crate::scoring::map_3_to_5(answer_3 as u8));
        ResponseModel {
            id: Uuid::new_v4(),
            token_id: None,
            client_id: Uuid::nil(),
            employee_id,
            division_id: None,
            department_id: None,
            team_id,
            sentiment_3: Some(answer_3),
            sentiment_5: Some(five),
            clarity_3: Some(answer_3),
            clarity_5: Some(five),
            workload_3: Some(answer_3),
            workload_5: Some(five),
            safety_3: Some(answer_3),
            safety_5: Some(five),
            leadership_3: Some(answer_3),
            leadership_5: Some(five),
            comment_text: None,
            support_requested: false,
            support_contact_method: None,
            support_contact_value: None,
            support_timeframe: None,
            high_risk_flag: false,
            risk_factors: None,
            meta: None,
            source: "survey".to_string(),
            submitted_at: submitted_at.into(),
        }
    }

    fn monday() -> DateTime<Utc> {
        // 2025-06-02 is a Monday
        Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()
    }

    #[test]
    fn week_starts_on_monday() {
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(week_start(sunday), monday);
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn empty_rows_produce_empty_aggregates() {
        let result = aggregate(&[], 10, &RiskThresholds::default());
        assert_eq!(result.total_responses, 0);
        assert_eq!(result.wellbeing_score, None);
        assert_eq!(result.band, None);
        assert_eq!(result.participation.rate, 0.0);
        assert_eq!(result.participation.confidence, ConfidenceBand::Low);
        assert!(result.trend.is_empty());
        assert_eq!(result.escalation.level, EscalationLevel::Low);
    }

    #[test]
    fn null_answers_are_skipped_not_zeroed() {
        let mut partial = row(monday(), 1, None, None);
        partial.clarity_3 = None;
        partial.clarity_5 = None;
        let full = row(monday(), 3, None, None);

        let result = aggregate(&[partial, full], 2, &RiskThresholds::default());
        let clarity = &result.domains[1];
        assert_eq!(clarity.domain, Domain::Clarity);
        assert_eq!(clarity.average, Some(1.0));
        assert_eq!(clarity.answered, 1);
        let sentiment = &result.domains[0];
        assert_eq!(sentiment.average, Some(3.0));
        assert_eq!(sentiment.score, Some(60.0));
    }

    #[test]
    fn participation_counts_distinct_employees() {
        let employee = Some(Uuid::new_v4());
        let rows = vec![
            row(monday(), 1, employee, None),
            row(monday(), 2, employee, None),
            row(monday(), 2, None, None),
        ];
        let result = aggregate(&rows, 4, &RiskThresholds::default());
        assert_eq!(result.participation.respondents, 2);
        assert_eq!(result.participation.rate, 50.0);
        assert_eq!(result.participation.confidence, ConfidenceBand::Moderate);
    }

    #[test]
    fn weekly_buckets_and_deltas() {
        let week_one = monday();
        let week_two = monday() + Duration::days(7);
        let rows = vec![row(week_one, 2, None, None), row(week_two, 1, None, None)];

        let result = aggregate(&rows, 0, &RiskThresholds::default());
        assert_eq!(result.trend.len(), 2);
        assert_eq!(result.trend[0].wellbeing, Some(60.0));
        assert_eq!(result.trend[1].wellbeing, Some(100.0));
        assert_eq!(result.wellbeing_delta, 40.0);
        assert_eq!(result.domains[0].delta, 40.0);
        assert_eq!(result.wellbeing_score, Some(80.0));
        assert_eq!(result.band.as_ref().map(|b| b.band), Some(RiskBand::Low));
    }

    #[test]
    fn struggling_teams_are_flagged() {
        let healthy = Uuid::new_v4();
        let struggling = Uuid::new_v4();
        let rows = vec![
            row(monday(), 1, Some(Uuid::new_v4()), Some(healthy)),
            row(monday(), 3, Some(Uuid::new_v4()), Some(struggling)),
            row(monday(), 3, Some(Uuid::new_v4()), Some(struggling)),
        ];

        let result = aggregate(&rows, 3, &RiskThresholds::default());
        assert_eq!(result.teams_below_threshold, 1);
        assert_eq!(result.teams_requiring_attention.len(), 1);
        let flagged = &result.teams_requiring_attention[0];
        assert_eq!(flagged.team_id, struggling);
        assert_eq!(flagged.score, 20.0);
        assert_eq!(flagged.respondents, 2);
        assert_eq!(result.team_deviation, Some(40.0));
        assert!(result.uneven_exposure);
        // safety 46.7 is critical (40) and the spread of 80 adds 25
        assert_eq!(result.escalation.points, 65);
        assert_eq!(result.escalation.level, EscalationLevel::High);
    }

    #[test]
    fn spread_alone_does_not_escalate() {
        let rows = vec![
            row(monday(), 1, Some(Uuid::new_v4()), Some(Uuid::new_v4())),
            row(monday(), 2, Some(Uuid::new_v4()), Some(Uuid::new_v4())),
        ];

        let result = aggregate(&rows, 2, &RiskThresholds::default());
        // teams at 100 and 60, overall safety 80
        assert_eq!(result.team_deviation, Some(20.0));
        assert!(result.uneven_exposure);
        assert_eq!(result.escalation.points, 25);
        assert_eq!(result.escalation.level, EscalationLevel::Low);
    }

    #[test]
    fn persistent_low_domains_are_systemic() {
        let week_one = monday();
        let week_two = monday() + Duration::days(7);
        let low_team = Uuid::new_v4();
        let high_team = Uuid::new_v4();
        let rows = vec![
            row(week_one, 3, None, Some(low_team)),
            row(week_one, 2, None, Some(high_team)),
            row(week_two, 3, None, Some(low_team)),
            row(week_two, 2, None, Some(high_team)),
        ];

        let result = aggregate(&rows, 4, &RiskThresholds::default());
        // every domain sits at 40 in both weeks and one of two teams is below 60
        assert_eq!(result.domain_risk.len(), Domain::ALL.len());
        for risk in &result.domain_risk {
            assert_eq!(risk.score, 40.0);
            assert_eq!(risk.persistence, 2);
            assert_eq!(risk.teams_below, 1);
            assert_eq!(risk.total_teams, 2);
            assert_eq!(risk.pattern, DomainPattern::SystemicDecline);
            assert_eq!(risk.status, DomainStatus::Elevated);
        }

        assert_eq!(result.domain_priority.len(), Domain::ALL.len());
        let top = &result.domain_priority[0];
        assert_eq!(top.why, "Below tolerance");
        // severity 30/70 plus a saturated 40 point team spread
        assert!((top.priority - 0.336).abs() < 1e-9);
    }

    #[test]
    fn support_and_risk_flags_are_counted() {
        let mut flagged = row(monday(), 3, None, None);
        flagged.support_requested = true;
        flagged.high_risk_flag = true;
        let result = aggregate(&[flagged, row(monday(), 1, None, None)], 2, &RiskThresholds::default());
        assert_eq!(result.support_requests, 1);
        assert_eq!(result.high_risk_flags, 1);
    }
}
