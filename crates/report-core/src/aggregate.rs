//! Grouped sums of the raw feeds by (UTC day, campaign) and (UTC hour, campaign)
//!
//! Amounts are added with [`NeumaierSum`] in input order, the same steps
//! SQLite's `SUM`/`AVG` take over REAL values.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::bucketer::TimeBucketer;
use crate::constants;
use crate::error::{ReportError, Result};
use crate::types::{
    CostAggregate, CostTotals, DayKey, HourKey, HourlyFact, HourlyFacts, RawCostRow,
    RawRevenueRow, RevenueAggregate, RevenueTotals,
};

/// Kahan-Babuska-Neumaier compensated running sum
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() > value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    /// Compensated total; a non-finite compensation term is dropped
    pub fn total(&self) -> f64 {
        if self.compensation.is_finite() {
            self.sum + self.compensation
        } else {
            self.sum
        }
    }
}

struct CostAccumulator {
    campaign_name: String,
    total_clicks: u64,
    total_cost: NeumaierSum,
}

#[derive(Default)]
struct HourAccumulator {
    cost: NeumaierSum,
    revenue: NeumaierSum,
}

/// Sum clicks and cost per (UTC day, campaign)
pub fn aggregate_cost(rows: &[RawCostRow], bucketer: &TimeBucketer) -> Result<CostAggregate> {
    let mut accumulators: BTreeMap<DayKey, CostAccumulator> = BTreeMap::new();

    for row in rows {
        let key = DayKey::new(
            bucketer.to_utc_day_bucket(row.local_timestamp)?,
            row.campaign_id.as_str(),
        );

        match accumulators.entry(key) {
            Entry::Vacant(slot) => {
                let total_clicks = add_clicks(0, row.clicks, slot.key())?;
                let mut total_cost = NeumaierSum::default();
                total_cost.add(row.cost);
                slot.insert(CostAccumulator {
                    campaign_name: row.campaign_name.clone(),
                    total_clicks,
                    total_cost,
                });
            }
            Entry::Occupied(mut slot) => {
                let total_clicks = add_clicks(slot.get().total_clicks, row.clicks, slot.key())?;
                let acc = slot.get_mut();
                acc.total_clicks = total_clicks;
                acc.total_cost.add(row.cost);
                if prefer_name(&row.campaign_name, &acc.campaign_name) {
                    acc.campaign_name.clone_from(&row.campaign_name);
                }
            }
        }
    }

    Ok(accumulators
        .into_iter()
        .map(|(key, acc)| {
            let totals = CostTotals {
                campaign_name: acc.campaign_name,
                total_clicks: acc.total_clicks,
                total_cost: acc.total_cost.total(),
            };
            (key, totals)
        })
        .collect())
}

/// Sum revenue per (UTC day, campaign)
pub fn aggregate_revenue(
    rows: &[RawRevenueRow],
    bucketer: &TimeBucketer,
) -> Result<RevenueAggregate> {
    let mut sums: BTreeMap<DayKey, NeumaierSum> = BTreeMap::new();

    for row in rows {
        let key = DayKey::new(
            bucketer.to_utc_day_bucket(row.local_timestamp)?,
            row.campaign_id.as_str(),
        );
        sums.entry(key).or_default().add(row.revenue);
    }

    Ok(sums
        .into_iter()
        .map(|(key, sum)| (key, RevenueTotals { total_revenue: sum.total() }))
        .collect())
}

/// Sum cost and revenue per (UTC hour, campaign).
///
/// An hour appears if either feed has a row in it; the other side stays zero.
pub fn aggregate_hourly(
    cost_rows: &[RawCostRow],
    revenue_rows: &[RawRevenueRow],
    bucketer: &TimeBucketer,
) -> Result<HourlyFacts> {
    let mut hours: BTreeMap<HourKey, HourAccumulator> = BTreeMap::new();

    for row in cost_rows {
        let key = HourKey::new(
            bucketer.to_utc_hour_bucket(row.local_timestamp)?,
            row.campaign_id.as_str(),
        );
        hours.entry(key).or_default().cost.add(row.cost);
    }

    for row in revenue_rows {
        let key = HourKey::new(
            bucketer.to_utc_hour_bucket(row.local_timestamp)?,
            row.campaign_id.as_str(),
        );
        hours.entry(key).or_default().revenue.add(row.revenue);
    }

    Ok(hours
        .into_iter()
        .map(|(key, acc)| {
            let fact = HourlyFact {
                hour_cost: acc.cost.total(),
                hour_revenue: acc.revenue.total(),
            };
            (key, fact)
        })
        .collect())
}

fn add_clicks(total: u64, clicks: u64, key: &DayKey) -> Result<u64> {
    total
        .checked_add(clicks)
        .filter(|sum| *sum <= constants::MAX_CLICKS)
        .ok_or_else(|| ReportError::ClickOverflow {
            campaign_id: key.campaign_id.clone(),
            utc_day: key.utc_day.to_string(),
        })
}

/// Campaign name tie-break: smallest non-empty name, like SQL MIN over
/// nullable names
fn prefer_name(candidate: &str, current: &str) -> bool {
    !candidate.is_empty() && (current.is_empty() || candidate < current)
}
