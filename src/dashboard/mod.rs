//! # Dashboard Aggregation
//!
//! Resolves the reporting window and org scope for a dashboard request and
//! folds the matching responses into KPIs, trends and risk signals.

pub mod aggregate;
pub mod period;

pub use aggregate::{DashboardAggregates, DomainSummary, Participation, WeeklyBucket, aggregate};
pub use period::{OrgScope, Period, ViewMode, window_start};
