//! Report CSV output

use anyhow::{Context, Result};
use campaign_report_core::{JoinedBucket, Metric};
use chrono::NaiveDate;
use csv::Writer;
use std::path::Path;

use crate::constants;

/// Column names in emitted order
pub fn header(hourly: bool) -> Vec<&'static str> {
    let mut columns = constants::DAILY_COLUMNS.to_vec();
    if hourly {
        columns.extend_from_slice(&constants::HOURLY_COLUMNS);
    }
    columns
}

/// Render buckets as text fields in column order
pub fn render_rows(buckets: &[JoinedBucket], hourly: bool) -> Vec<Vec<String>> {
    buckets
        .iter()
        .map(|bucket| {
            let mut fields = vec![
                format_day(bucket.utc_day),
                bucket.campaign_id.clone(),
                bucket.campaign_name.clone(),
                format_amount(bucket.total_revenue),
                format_amount(bucket.total_cost),
                format_amount(bucket.total_profit),
                bucket.total_clicks.to_string(),
                format_metric(bucket.total_roi),
                format_metric(bucket.avg_cpc),
            ];
            if hourly {
                match bucket.hourly {
                    Some(columns) => {
                        fields.push(format_metric(columns.hourly_avg_revenue));
                        fields.push(columns.positive_profit_hours.to_string());
                    }
                    None => fields.extend([String::new(), String::new()]),
                }
            }
            fields
        })
        .collect()
}

/// Write the report; returns the number of data rows
pub fn write_report(path: &Path, buckets: &[JoinedBucket], hourly: bool) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let mut wtr = Writer::from_path(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;

    wtr.write_record(header(hourly))?;
    let rows = render_rows(buckets, hourly);
    for row in &rows {
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(rows.len())
}

/// UTC day as YYYY/MM/DD
pub fn format_day(day: NaiveDate) -> String {
    day.format(constants::OUTPUT_DAY_FORMAT).to_string()
}

/// Shortest round-trip decimal with at least one fractional digit ("20.0", "0.5")
pub fn format_amount(value: f64) -> String {
    let value = normalize_zero(value);
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Missing-value marker is an empty field
pub fn format_metric(value: Metric) -> String {
    value.map(format_amount).unwrap_or_default()
}

/// Normalize -0.0 to 0.0 for cleaner display
fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}
