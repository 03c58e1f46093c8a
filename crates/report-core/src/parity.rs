//! Cross-checking the procedural and relational engines

use crate::types::{JoinedBucket, Metric};

/// Describe every difference between two reports; empty means they agree.
///
/// Every column must match exactly, amounts included.
pub fn report_mismatches(left: &[JoinedBucket], right: &[JoinedBucket]) -> Vec<String> {
    let mut mismatches = Vec::new();

    if left.len() != right.len() {
        mismatches.push(format!("row count {} vs {}", left.len(), right.len()));
    }

    for (i, (a, b)) in left.iter().zip(right).enumerate() {
        let row = format!("row {} ({} / {})", i, a.utc_day, a.campaign_id);

        if a.utc_day != b.utc_day || a.campaign_id != b.campaign_id {
            mismatches.push(format!(
                "{}: key differs from {} / {}",
                row, b.utc_day, b.campaign_id
            ));
            continue;
        }
        if a.campaign_name != b.campaign_name {
            mismatches.push(format!(
                "{}: campaign_name {:?} vs {:?}",
                row, a.campaign_name, b.campaign_name
            ));
        }
        if a.total_clicks != b.total_clicks {
            mismatches.push(format!(
                "{}: total_clicks {} vs {}",
                row, a.total_clicks, b.total_clicks
            ));
        }

        let amounts = [
            ("total_revenue", Some(a.total_revenue), Some(b.total_revenue)),
            ("total_cost", Some(a.total_cost), Some(b.total_cost)),
            ("total_profit", Some(a.total_profit), Some(b.total_profit)),
            ("total_roi", a.total_roi, b.total_roi),
            ("avg_cpc", a.avg_cpc, b.avg_cpc),
            (
                "hourly_avg_revenue",
                a.hourly.and_then(|h| h.hourly_avg_revenue),
                b.hourly.and_then(|h| h.hourly_avg_revenue),
            ),
        ];
        for (column, x, y) in amounts {
            if !metrics_agree(x, y) {
                mismatches.push(format!("{}: {} {:?} vs {:?}", row, column, x, y));
            }
        }

        let hours_a = a.hourly.map(|h| h.positive_profit_hours);
        let hours_b = b.hourly.map(|h| h.positive_profit_hours);
        if hours_a != hours_b {
            mismatches.push(format!(
                "{}: positive_profit_hours {:?} vs {:?}",
                row, hours_a, hours_b
            ));
        }
    }

    mismatches
}

fn metrics_agree(a: Metric, b: Metric) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
