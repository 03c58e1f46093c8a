//! Row, key and bucket types shared by both report engines

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;

/// A derived ratio. `None` is the missing-value marker: the ratio is undefined
/// for this bucket (zero clicks, zero cost, or no observed hours).
pub type Metric = Option<f64>;

/// One parsed row of the cost feed
#[derive(Debug, Clone, PartialEq)]
pub struct RawCostRow {
    /// Wall-clock time in the source timezone
    pub local_timestamp: NaiveDateTime,
    pub campaign_id: String,
    pub campaign_name: String,
    pub clicks: u64,
    pub cost: f64,
}

/// One parsed row of the revenue feed
#[derive(Debug, Clone, PartialEq)]
pub struct RawRevenueRow {
    /// Wall-clock time in the source timezone
    pub local_timestamp: NaiveDateTime,
    pub campaign_id: String,
    pub revenue: f64,
}

/// (UTC day, campaign) grouping key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey {
    pub utc_day: NaiveDate,
    pub campaign_id: String,
}

impl DayKey {
    pub fn new(utc_day: NaiveDate, campaign_id: impl Into<String>) -> Self {
        Self {
            utc_day,
            campaign_id: campaign_id.into(),
        }
    }
}

/// (UTC hour, campaign) grouping key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourKey {
    /// Start of the UTC hour
    pub utc_hour: DateTime<Utc>,
    pub campaign_id: String,
}

impl HourKey {
    pub fn new(utc_hour: DateTime<Utc>, campaign_id: impl Into<String>) -> Self {
        Self {
            utc_hour,
            campaign_id: campaign_id.into(),
        }
    }

    /// UTC day this hour belongs to
    pub fn utc_day(&self) -> NaiveDate {
        self.utc_hour.date_naive()
    }
}

/// Daily cost sums for one campaign
#[derive(Debug, Clone, PartialEq)]
pub struct CostTotals {
    /// Smallest non-empty name seen for the bucket ("" if none)
    pub campaign_name: String,
    pub total_clicks: u64,
    pub total_cost: f64,
}

/// Daily revenue sum for one campaign
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueTotals {
    pub total_revenue: f64,
}

pub type CostAggregate = BTreeMap<DayKey, CostTotals>;
pub type RevenueAggregate = BTreeMap<DayKey, RevenueTotals>;

/// Hourly sums of both feeds for one campaign; a missing side is zero
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HourlyFact {
    pub hour_cost: f64,
    pub hour_revenue: f64,
}

pub type HourlyFacts = BTreeMap<HourKey, HourlyFact>;

/// Columns appended in hourly mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyColumns {
    /// Mean revenue over the hours that saw any row
    pub hourly_avg_revenue: Metric,
    /// Hours with strictly positive profit
    pub positive_profit_hours: u32,
}

/// One report row: the outer join of both daily aggregates plus derived metrics
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedBucket {
    pub utc_day: NaiveDate,
    pub campaign_id: String,
    pub campaign_name: String,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_clicks: u64,
    pub total_profit: f64,
    pub total_roi: Metric,
    pub avg_cpc: Metric,
    /// Present only in hourly mode
    pub hourly: Option<HourlyColumns>,
}

impl JoinedBucket {
    pub fn key(&self) -> DayKey {
        DayKey::new(self.utc_day, self.campaign_id.clone())
    }
}
