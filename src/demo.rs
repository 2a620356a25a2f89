//! Synthetic survey data for demonstrations.
//!
//! Answers are drawn with weights 40% favourable, 35% neutral and 25%
//! unfavourable so dashboards show a mix of bands. The balanced variant
//! instead gives every org unit the same number of rows and cycles units
//! through thriving, mixed and critical profiles. Rows are tagged
//! `demo_seed` and can be removed without touching real submissions.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::scoring::ThreePointAnswers;

/// Rows inserted per seed request
pub const DEMO_ROW_COUNT: usize = 50;
/// Submissions are spread over this many days back from now
pub const DEMO_WINDOW_DAYS: i64 = 60;
/// Rows per org unit for a balanced seed
pub const BALANCED_ROWS_PER_UNIT: usize = 8;
/// Balanced submissions are spread over this many days back from now
pub const BALANCED_WINDOW_DAYS: i64 = 180;

/// Where a synthetic respondent sits in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrgPlacement {
    pub division_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
}

/// One generated submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoResponse {
    pub answers: ThreePointAnswers,
    pub placement: OrgPlacement,
    pub submitted_at: DateTime<Utc>,
}

/// Draw a 3-point answer: 1 with 40%, 2 with 35%, 3 with 25%
pub fn weighted_answer<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    let roll: f64 = rng.r#gen();
    if roll < 0.40 {
        1
    } else if roll < 0.75 {
        2
    } else {
        3
    }
}

/// Generate `count` responses within the last [`DEMO_WINDOW_DAYS`] days.
///
/// When `placements` is non-empty each row is assigned one at random so
/// team level figures have data.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    count: usize,
    placements: &[OrgPlacement],
) -> Vec<DemoResponse> {
    (0..count)
        .map(|_| {
            let days_back = rng.gen_range(0..=DEMO_WINDOW_DAYS);
            let answers = ThreePointAnswers {
                sentiment: weighted_answer(rng),
                clarity: weighted_answer(rng),
                workload: weighted_answer(rng),
                safety: weighted_answer(rng),
                leadership: weighted_answer(rng),
            };
            let placement = if placements.is_empty() {
                OrgPlacement::default()
            } else {
                placements[rng.gen_range(0..placements.len())]
            };
            DemoResponse {
                answers,
                placement,
                submitted_at: now - Duration::days(days_back),
            }
        })
        .collect()
}

/// Answer profile of one org unit in a balanced seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitProfile {
    /// Always favourable
    Thriving,
    /// Uniform over all three answers
    Mixed,
    /// Always unfavourable
    Critical,
}

impl UnitProfile {
    const CYCLE: [UnitProfile; 3] = [UnitProfile::Thriving, UnitProfile::Mixed, UnitProfile::Critical];

    /// Profile of the unit at `index`, cycling thriving, mixed, critical
    pub fn for_unit(index: usize) -> Self {
        Self::CYCLE[index % Self::CYCLE.len()]
    }

    pub fn answer<R: Rng + ?Sized>(self, rng: &mut R) -> u8 {
        match self {
            UnitProfile::Thriving => 1,
            UnitProfile::Mixed => rng.gen_range(1..=3),
            UnitProfile::Critical => 3,
        }
    }
}

/// Generate `per_unit` responses for every placement, spread over the last
/// [`BALANCED_WINDOW_DAYS`] days.
///
/// With no placements a single unplaced unit is seeded.
pub fn generate_balanced<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    per_unit: usize,
    placements: &[OrgPlacement],
) -> Vec<DemoResponse> {
    let unplaced = [OrgPlacement::default()];
    let units = if placements.is_empty() { &unplaced[..] } else { placements };

    units
        .iter()
        .enumerate()
        .flat_map(|(index, placement)| {
            let profile = UnitProfile::for_unit(index);
            (0..per_unit)
                .map(|_| {
                    let days_back = rng.gen_range(0..=BALANCED_WINDOW_DAYS);
                    DemoResponse {
                        answers: ThreePointAnswers {
                            sentiment: profile.answer(rng),
                            clarity: profile.answer(rng),
                            workload: profile.answer(rng),
                            safety: profile.answer(rng),
                            leadership: profile.answer(rng),
                        },
                        placement: *placement,
                        submitted_at: now - Duration::days(days_back),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
