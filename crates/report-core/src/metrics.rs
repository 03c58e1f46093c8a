//! Derived report columns: profit, ROI, CPC and the hourly extras
//!
//! Every ratio goes through [`safe_div`], so a zero denominator yields the
//! missing-value marker instead of infinity or NaN.

use crate::aggregate::NeumaierSum;
use crate::types::{HourKey, HourlyColumns, HourlyFacts, JoinedBucket, Metric};

/// Divide, or return the missing-value marker when the denominator is zero
pub fn safe_div(numerator: f64, denominator: f64) -> Metric {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Fill in profit, ROI and average CPC
pub fn enrich(mut bucket: JoinedBucket) -> JoinedBucket {
    let clicks = bucket.total_clicks as f64;

    bucket.total_profit = bucket.total_revenue - bucket.total_cost;
    bucket.avg_cpc = safe_div(bucket.total_cost, clicks);

    // Revenue per click over cost per click, kept unsimplified so it matches
    // the SQL formulation bit for bit.
    bucket.total_roi = if bucket.total_clicks == 0 || bucket.total_cost == 0.0 {
        None
    } else {
        let value_per_click = bucket.total_revenue / clicks;
        let cost_per_click = bucket.total_cost / clicks;
        safe_div(value_per_click, cost_per_click)
    };

    bucket
}

/// Fill in the hourly columns from the hours of this bucket's day and campaign
pub fn derive_hourly(mut bucket: JoinedBucket, facts: &HourlyFacts) -> JoinedBucket {
    let day_start = HourKey::new(
        bucket.utc_day.and_time(chrono::NaiveTime::MIN).and_utc(),
        String::new(),
    );

    let mut observed_hours = 0u32;
    let mut revenue_sum = NeumaierSum::default();
    let mut positive_profit_hours = 0u32;

    let hours = facts
        .range(day_start..)
        .take_while(|(key, _)| key.utc_day() == bucket.utc_day)
        .filter(|(key, _)| key.campaign_id == bucket.campaign_id);

    for (_, fact) in hours {
        observed_hours += 1;
        revenue_sum.add(fact.hour_revenue);
        if fact.hour_revenue - fact.hour_cost > 0.0 {
            positive_profit_hours += 1;
        }
    }

    bucket.hourly = Some(HourlyColumns {
        hourly_avg_revenue: safe_div(revenue_sum.total(), f64::from(observed_hours)),
        positive_profit_hours,
    });
    bucket
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HourlyFact;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn bucket(revenue: f64, cost: f64, clicks: u64) -> JoinedBucket {
        JoinedBucket {
            utc_day: NaiveDate::from_ymd_opt(2019, 1, 16).unwrap(),
            campaign_id: "7".to_string(),
            campaign_name: "Spring".to_string(),
            total_revenue: revenue,
            total_cost: cost,
            total_clicks: clicks,
            total_profit: 0.0,
            total_roi: None,
            avg_cpc: None,
            hourly: None,
        }
    }

    fn hour_key(d: u32, h: u32, campaign: &str) -> HourKey {
        HourKey::new(Utc.with_ymd_and_hms(2019, 1, d, h, 0, 0).unwrap(), campaign)
    }

    fn fact(cost: f64, revenue: f64) -> HourlyFact {
        HourlyFact {
            hour_cost: cost,
            hour_revenue: revenue,
        }
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(1.0, 4.0), Some(0.25));
        assert_eq!(safe_div(1.0, 0.0), None);
        assert_eq!(safe_div(0.0, 0.0), None);
    }

    #[test]
    fn test_enrich_full_bucket() {
        let b = enrich(bucket(20.0, 5.0, 10));
        assert_eq!(b.total_profit, 15.0);
        assert_eq!(b.total_roi, Some(4.0));
        assert_eq!(b.avg_cpc, Some(0.5));
    }

    #[test]
    fn test_enrich_zero_clicks() {
        let b = enrich(bucket(30.0, 0.0, 0));
        assert_eq!(b.total_profit, 30.0);
        assert_eq!(b.total_roi, None);
        assert_eq!(b.avg_cpc, None);
    }

    #[test]
    fn test_enrich_zero_cost_with_clicks() {
        let b = enrich(bucket(30.0, 0.0, 3));
        assert_eq!(b.total_roi, None);
        assert_eq!(b.avg_cpc, Some(0.0));
    }

    #[test]
    fn test_enrich_clicks_without_revenue() {
        let b = enrich(bucket(0.0, 2.0, 4));
        assert_eq!(b.total_profit, -2.0);
        assert_eq!(b.total_roi, Some(0.0));
        assert_eq!(b.avg_cpc, Some(0.5));
    }

    #[test]
    fn test_enrich_is_order_independent() {
        let inputs = vec![bucket(20.0, 5.0, 10), bucket(1.0, 3.0, 0), bucket(7.0, 7.0, 7)];
        let forward: Vec<_> = inputs.iter().cloned().map(enrich).collect();
        let mut backward: Vec<_> = inputs.iter().rev().cloned().map(enrich).collect();
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_derive_hourly_averages_observed_hours_only() {
        let mut facts = HourlyFacts::new();
        facts.insert(hour_key(16, 3, "7"), fact(1.0, 4.0));
        facts.insert(hour_key(16, 9, "7"), fact(2.0, 0.0));
        facts.insert(hour_key(16, 20, "7"), fact(0.0, 8.0));
        // Other campaign and neighbouring days stay out
        facts.insert(hour_key(16, 9, "8"), fact(0.0, 100.0));
        facts.insert(hour_key(15, 23, "7"), fact(0.0, 100.0));
        facts.insert(hour_key(17, 0, "7"), fact(0.0, 100.0));

        let b = derive_hourly(bucket(12.0, 3.0, 1), &facts);
        let hourly = b.hourly.unwrap();
        assert_eq!(hourly.hourly_avg_revenue, Some(4.0));
        assert_eq!(hourly.positive_profit_hours, 2);
    }

    #[test]
    fn test_derive_hourly_zero_profit_hour_not_positive() {
        let mut facts = HourlyFacts::new();
        facts.insert(hour_key(16, 1, "7"), fact(5.0, 5.0));
        facts.insert(hour_key(16, 2, "7"), fact(5.0, 5.5));

        let hourly = derive_hourly(bucket(10.5, 10.0, 2), &facts).hourly.unwrap();
        assert_eq!(hourly.positive_profit_hours, 1);
        assert_eq!(hourly.hourly_avg_revenue, Some(5.25));
    }

    #[test]
    fn test_derive_hourly_average_is_compensated() {
        let mut facts = HourlyFacts::new();
        facts.insert(hour_key(16, 1, "7"), fact(0.0, 0.1));
        facts.insert(hour_key(16, 2, "7"), fact(0.0, 0.2));
        facts.insert(hour_key(16, 3, "7"), fact(0.0, 0.3));

        let hourly = derive_hourly(bucket(0.6, 0.0, 0), &facts).hourly.unwrap();
        assert_eq!(hourly.hourly_avg_revenue, Some(0.6 / 3.0));
        assert_eq!(hourly.positive_profit_hours, 3);
    }

    #[test]
    fn test_derive_hourly_without_hours() {
        let hourly = derive_hourly(bucket(0.0, 0.0, 0), &HourlyFacts::new())
            .hourly
            .unwrap();
        assert_eq!(hourly.hourly_avg_revenue, None);
        assert_eq!(hourly.positive_profit_hours, 0);
    }
}
