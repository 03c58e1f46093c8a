//! Centralized constants for the report CLI
//!
//! Engine-level values (source timezone, timestamp format) live in
//! `campaign_report_core::constants`.

// =============================================================================
// File Names
// =============================================================================

/// Config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "report.toml";

/// Cost feed (data_date, campaign_id, campaign_name, clicks, cost)
pub const DEFAULT_COST_FILE: &str = "cost_1.csv";

/// Revenue feed (data_date, campaign_id, revenue)
pub const DEFAULT_REVENUE_FILE: &str = "revenue_1.csv";

/// Generated report
pub const DEFAULT_OUTPUT_FILE: &str = "report.csv";

// =============================================================================
// Formats
// =============================================================================

/// `--date-from` / `--date-to` format (UTC days)
pub const INPUT_DAY_FORMAT: &str = "%Y-%m-%d";

/// `date` column of the report
pub const OUTPUT_DAY_FORMAT: &str = "%Y/%m/%d";

// =============================================================================
// Report Columns
// =============================================================================

pub const DAILY_COLUMNS: [&str; 9] = [
    "date",
    "campaign_id",
    "campaign_name",
    "total_revenue",
    "total_cost",
    "total_profit",
    "total_clicks",
    "total_roi",
    "avg_cpc",
];

pub const HOURLY_COLUMNS: [&str; 2] = ["hourly_avg_revenue", "positive_profit_hours"];

/// Mismatches printed before a failed parity check gives up listing them
pub const MAX_REPORTED_MISMATCHES: usize = 20;
