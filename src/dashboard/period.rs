//! Reporting windows and organisational scope for dashboard queries.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Named reporting period. Unknown names resolve to [`Period::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    ThisMonth,
    LastMonth,
    #[serde(rename = "last_3_months")]
    Last3Months,
    #[serde(rename = "last_6_months")]
    Last6Months,
    #[serde(rename = "last_12_months")]
    Last12Months,
    Week,
    Month,
    Quarter,
    #[default]
    All,
}

impl Period {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim).unwrap_or_default() {
            "this_month" => Period::ThisMonth,
            "last_month" => Period::LastMonth,
            "last_3_months" => Period::Last3Months,
            "last_6_months" => Period::Last6Months,
            "last_12_months" => Period::Last12Months,
            "week" => Period::Week,
            "month" => Period::Month,
            "quarter" => Period::Quarter,
            _ => Period::All,
        }
    }

    /// Inclusive lower bound on `submitted_at`, or `None` for no bound
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::ThisMonth => first_of_month(now.year(), now.month()),
            Period::LastMonth => {
                let (year, month) = if now.month() == 1 {
                    (now.year() - 1, 12)
                } else {
                    (now.year(), now.month() - 1)
                };
                first_of_month(year, month)
            }
            Period::Last3Months | Period::Quarter => Some(now - Duration::days(90)),
            Period::Last6Months => Some(now - Duration::days(180)),
            Period::Last12Months => Some(now - Duration::days(365)),
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => Some(now - Duration::days(30)),
            Period::All => None,
        }
    }
}

fn first_of_month(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// `live` restricts the dashboard to today's submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Period,
    Live,
}

impl ViewMode {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("live") => ViewMode::Live,
            _ => ViewMode::Period,
        }
    }
}

/// Lower bound for a dashboard query; live mode overrides the period
pub fn window_start(period: Period, mode: ViewMode, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match mode {
        ViewMode::Live => now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive)),
        ViewMode::Period => period.start(now),
    }
}

/// The narrowest organisational unit a query is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(tag = "level", content = "id", rename_all = "lowercase")]
pub enum OrgScope {
    #[default]
    All,
    Division(Uuid),
    Department(Uuid),
    Team(Uuid),
}

impl OrgScope {
    /// Team wins over department, which wins over division
    pub fn resolve(division: Option<Uuid>, department: Option<Uuid>, team: Option<Uuid>) -> Self {
        match (team, department, division) {
            (Some(team), _, _) => OrgScope::Team(team),
            (None, Some(department), _) => OrgScope::Department(department),
            (None, None, Some(division)) => OrgScope::Division(division),
            (None, None, None) => OrgScope::All,
        }
    }
}
