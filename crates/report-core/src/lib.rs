//! Campaign performance report engine
//!
//! Turns a cost/clicks feed and a revenue feed, both stamped with local wall
//! clock times, into one row per (UTC day, campaign) with profit, ROI and
//! average CPC. Two engines compute the same report: a procedural pipeline
//! ([`pipeline::build_report`]) and a SQLite query
//! ([`sql::build_report_sql`]).

pub mod aggregate;
pub mod bucketer;
pub mod constants;
pub mod error;
pub mod join;
pub mod metrics;
pub mod parity;
pub mod pipeline;
pub mod select;
pub mod sql;
pub mod types;

pub use bucketer::TimeBucketer;
pub use error::{ReportError, Result};
pub use pipeline::{ReportOptions, build_report};
pub use sql::{SqlReportEngine, build_report_sql};
pub use types::{
    CostAggregate, DayKey, HourKey, HourlyColumns, HourlyFact, HourlyFacts, JoinedBucket, Metric,
    RawCostRow, RawRevenueRow, RevenueAggregate,
};
