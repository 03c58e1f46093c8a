//! Full outer join of the daily cost and revenue aggregates

use crate::types::{CostAggregate, DayKey, JoinedBucket, RevenueAggregate};

/// Join both aggregates on (UTC day, campaign).
///
/// Every key of either side yields exactly one bucket. A missing cost side
/// means no name and zero cost/clicks; a missing revenue side means zero
/// revenue. Output follows key order.
pub fn join_buckets(cost: &CostAggregate, revenue: &RevenueAggregate) -> Vec<JoinedBucket> {
    let mut buckets = Vec::with_capacity(cost.len().max(revenue.len()));

    for (key, totals) in cost {
        let total_revenue = revenue.get(key).map_or(0.0, |r| r.total_revenue);
        buckets.push(new_bucket(
            key,
            totals.campaign_name.clone(),
            total_revenue,
            totals.total_cost,
            totals.total_clicks,
        ));
    }

    for (key, totals) in revenue {
        if !cost.contains_key(key) {
            buckets.push(new_bucket(key, String::new(), totals.total_revenue, 0.0, 0));
        }
    }

    buckets.sort_by(|a, b| (a.utc_day, &a.campaign_id).cmp(&(b.utc_day, &b.campaign_id)));
    buckets
}

fn new_bucket(
    key: &DayKey,
    campaign_name: String,
    total_revenue: f64,
    total_cost: f64,
    total_clicks: u64,
) -> JoinedBucket {
    JoinedBucket {
        utc_day: key.utc_day,
        campaign_id: key.campaign_id.clone(),
        campaign_name,
        total_revenue,
        total_cost,
        total_clicks,
        total_profit: 0.0,
        total_roi: None,
        avg_cpc: None,
        hourly: None,
    }
}
