//! Procedural report engine
//!
//! raw rows -> day/hour buckets -> grouped sums -> outer join -> metrics
//! -> hourly extras -> date range -> ordering

use chrono::NaiveDate;
use tracing::debug;

use crate::aggregate::{aggregate_cost, aggregate_hourly, aggregate_revenue};
use crate::bucketer::TimeBucketer;
use crate::error::{ReportError, Result};
use crate::join::join_buckets;
use crate::metrics::{derive_hourly, enrich};
use crate::select::{select_range, sort_buckets};
use crate::types::{HourlyFacts, JoinedBucket, RawCostRow, RawRevenueRow};

/// Parameters of one report run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// First UTC day to report (inclusive)
    pub date_from: NaiveDate,
    /// Last UTC day to report (inclusive)
    pub date_to: NaiveDate,
    /// Append the hourly-derived columns
    pub hourly: bool,
}

impl ReportOptions {
    pub fn new(date_from: NaiveDate, date_to: NaiveDate, hourly: bool) -> Result<Self> {
        if date_from > date_to {
            return Err(ReportError::InvalidRange {
                from: date_from.to_string(),
                to: date_to.to_string(),
            });
        }
        Ok(Self {
            date_from,
            date_to,
            hourly,
        })
    }
}

/// Build the report in memory.
///
/// The cost and revenue passes are independent and run in parallel; the join
/// starts once both have finished.
pub fn build_report(
    cost_rows: &[RawCostRow],
    revenue_rows: &[RawRevenueRow],
    options: &ReportOptions,
    bucketer: &TimeBucketer,
) -> Result<Vec<JoinedBucket>> {
    let ((cost, revenue), hourly_facts) = rayon::join(
        || {
            rayon::join(
                || aggregate_cost(cost_rows, bucketer),
                || aggregate_revenue(revenue_rows, bucketer),
            )
        },
        || {
            options
                .hourly
                .then(|| aggregate_hourly(cost_rows, revenue_rows, bucketer))
                .transpose()
        },
    );
    let (cost, revenue, hourly_facts) = (cost?, revenue?, hourly_facts?);

    debug!(
        cost_buckets = cost.len(),
        revenue_buckets = revenue.len(),
        "aggregated daily feeds"
    );

    let buckets = join_buckets(&cost, &revenue);
    let buckets = select_range(buckets, options.date_from, options.date_to);

    let mut buckets: Vec<JoinedBucket> = buckets
        .into_iter()
        .map(enrich)
        .map(|bucket| with_hourly(bucket, hourly_facts.as_ref()))
        .collect();
    sort_buckets(&mut buckets);

    debug!(rows = buckets.len(), "report rows in range");
    Ok(buckets)
}

fn with_hourly(bucket: JoinedBucket, facts: Option<&HourlyFacts>) -> JoinedBucket {
    match facts {
        Some(facts) => derive_hourly(bucket, facts),
        None => bucket,
    }
}
