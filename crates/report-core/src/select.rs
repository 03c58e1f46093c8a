//! Date-range selection and final row ordering

use chrono::NaiveDate;

use crate::types::JoinedBucket;

/// Keep buckets with `from <= utc_day <= to` (UTC days, both ends inclusive)
pub fn select_range(buckets: Vec<JoinedBucket>, from: NaiveDate, to: NaiveDate) -> Vec<JoinedBucket> {
    buckets
        .into_iter()
        .filter(|b| (from..=to).contains(&b.utc_day))
        .collect()
}

/// Emitted row order: UTC day, then campaign id
pub fn sort_buckets(buckets: &mut [JoinedBucket]) {
    buckets.sort_by(|a, b| {
        a.utc_day
            .cmp(&b.utc_day)
            .then_with(|| a.campaign_id.cmp(&b.campaign_id))
    });
}
