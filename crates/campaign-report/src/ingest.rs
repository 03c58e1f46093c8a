//! CSV ingestion of the cost and revenue feeds
//!
//! Any malformed row (timestamp, number, missing column) aborts the feed with
//! `ReportError::MalformedInput`. Empty numeric fields count as zero.

use anyhow::{Context, Result};
use campaign_report_core::constants::MAX_CLICKS;
use campaign_report_core::{RawCostRow, RawRevenueRow, ReportError, TimeBucketer};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

const COST_FEED: &str = "cost";
const REVENUE_FEED: &str = "revenue";

/// Cost feed record as it appears in the file
#[derive(Debug, Deserialize)]
struct CostRecord {
    data_date: String,
    campaign_id: String,
    campaign_name: String,
    clicks: String,
    cost: String,
}

/// Revenue feed record as it appears in the file
#[derive(Debug, Deserialize)]
struct RevenueRecord {
    data_date: String,
    campaign_id: String,
    revenue: String,
}

/// Load and validate the cost feed
pub fn load_cost_rows(path: &Path) -> Result<Vec<RawCostRow>> {
    let mut rows = Vec::new();

    for (line, record) in read_records::<CostRecord>(path, COST_FEED)? {
        rows.push(RawCostRow {
            local_timestamp: parse_timestamp(&record.data_date, COST_FEED, line)?,
            campaign_id: record.campaign_id.trim().to_string(),
            campaign_name: record.campaign_name.trim().to_string(),
            clicks: parse_clicks(&record.clicks, COST_FEED, line)?,
            cost: parse_amount(&record.cost, "cost", COST_FEED, line)?,
        });
    }

    Ok(rows)
}

/// Load and validate the revenue feed
pub fn load_revenue_rows(path: &Path) -> Result<Vec<RawRevenueRow>> {
    let mut rows = Vec::new();

    for (line, record) in read_records::<RevenueRecord>(path, REVENUE_FEED)? {
        rows.push(RawRevenueRow {
            local_timestamp: parse_timestamp(&record.data_date, REVENUE_FEED, line)?,
            campaign_id: record.campaign_id.trim().to_string(),
            revenue: parse_amount(&record.revenue, "revenue", REVENUE_FEED, line)?,
        });
    }

    Ok(rows)
}

/// Deserialize every record, paired with the file line it starts on
fn read_records<T: DeserializeOwned>(path: &Path, feed: &'static str) -> Result<Vec<(u64, T)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open feed: {}", path.display()))?;

    let headers = rdr
        .headers()
        .map_err(|e| malformed(feed, error_line(&e), e.to_string()))?
        .clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| malformed(feed, error_line(&e), e.to_string()))?;
        // Start line of the record; quoted fields may span lines
        let line = record.position().map_or(0, |p| p.line());
        let parsed = record
            .deserialize(Some(&headers))
            .map_err(|e| malformed(feed, line, e.to_string()))?;
        records.push((line, parsed));
    }

    Ok(records)
}

fn error_line(err: &csv::Error) -> u64 {
    err.position().map_or(0, |p| p.line())
}

fn malformed(feed: &'static str, line: u64, detail: String) -> ReportError {
    ReportError::MalformedInput { feed, line, detail }
}

fn parse_timestamp(
    text: &str,
    feed: &'static str,
    line: u64,
) -> std::result::Result<chrono::NaiveDateTime, ReportError> {
    TimeBucketer::parse_local(text)
        .map_err(|e| malformed(feed, line, format!("data_date {:?}: {}", text, e)))
}

/// Non-negative decimal; empty means zero
fn parse_amount(
    field: &str,
    column: &str,
    feed: &'static str,
    line: u64,
) -> std::result::Result<f64, ReportError> {
    let text = field.trim();
    if text.is_empty() {
        return Ok(0.0);
    }

    let value: f64 = text
        .parse()
        .map_err(|_| malformed(feed, line, format!("{} {:?} is not a number", column, text)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(malformed(
            feed,
            line,
            format!("{} {:?} must be a non-negative amount", column, text),
        ));
    }
    Ok(value)
}

/// Non-negative whole number up to `MAX_CLICKS`; "12.0" is accepted, empty means zero
fn parse_clicks(
    field: &str,
    feed: &'static str,
    line: u64,
) -> std::result::Result<u64, ReportError> {
    let text = field.trim();
    if text.is_empty() {
        return Ok(0);
    }
    if let Ok(clicks) = text.parse::<u64>() {
        if clicks <= MAX_CLICKS {
            return Ok(clicks);
        }
    }

    match text.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value >= 0.0
                && value < MAX_CLICKS as f64
                && value.fract() == 0.0 =>
        {
            Ok(value as u64)
        }
        _ => Err(malformed(
            feed,
            line,
            format!("clicks {:?} must be a non-negative whole number", text),
        )),
    }
}
