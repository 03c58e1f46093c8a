//! Configuration for the report CLI

use anyhow::{Context, Result};
use campaign_report_core::constants::SOURCE_TIMEZONE;
use campaign_report_core::{ReportOptions, TimeBucketer};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants;

// =============================================================================
// Command-line Arguments
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "campaign-report")]
#[command(about = "Daily per-campaign performance report from cost and revenue feeds")]
pub struct Args {
    /// Cost feed CSV (data_date, campaign_id, campaign_name, clicks, cost)
    #[arg(long)]
    pub cost: Option<PathBuf>,

    /// Revenue feed CSV (data_date, campaign_id, revenue)
    #[arg(long)]
    pub revenue: Option<PathBuf>,

    /// First UTC day to report, inclusive (YYYY-MM-DD)
    #[arg(long = "date-from", value_parser = parse_utc_day)]
    pub date_from: NaiveDate,

    /// Last UTC day to report, inclusive (YYYY-MM-DD)
    #[arg(long = "date-to", value_parser = parse_utc_day)]
    pub date_to: NaiveDate,

    /// Output CSV path
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Add hourly_avg_revenue and positive_profit_hours columns
    #[arg(long)]
    pub hourly: bool,

    /// Report engine
    #[arg(long, value_enum)]
    pub engine: Option<Engine>,

    /// IANA timezone the feeds are recorded in (default: America/New_York)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Config file (optional unless given explicitly)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Which implementation computes the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// In-memory aggregation pipeline
    #[default]
    Procedural,
    /// SQLite query over the bucketed feeds
    Sql,
    /// Run both and fail if they disagree
    Both,
}

fn parse_utc_day(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), constants::INPUT_DAY_FORMAT)
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

// =============================================================================
// File-based Configuration (report.toml)
// =============================================================================

/// Configuration loaded from report.toml; every key is optional
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportSection {
    pub timezone: Option<String>,
    pub engine: Option<Engine>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InputSection {
    pub cost: Option<PathBuf>,
    pub revenue: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputSection {
    pub path: Option<PathBuf>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse {}. Expected optional [report], [input] and [output] tables.",
                path.display()
            )
        })
    }

    /// Load the file named by `--config`, or the default file if it exists
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(constants::DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Arguments merged over the config file, with defaults filled in
#[derive(Debug)]
pub struct Config {
    pub cost_path: PathBuf,
    pub revenue_path: PathBuf,
    pub out_path: PathBuf,
    pub engine: Engine,
    pub options: ReportOptions,
    pub bucketer: TimeBucketer,
}

impl Config {
    /// Flags win over the file, the file wins over built-in defaults
    pub fn from_args(args: &Args, file_config: FileConfig) -> Result<Self> {
        let timezone = args
            .timezone
            .clone()
            .or(file_config.report.timezone)
            .unwrap_or_else(|| SOURCE_TIMEZONE.to_string());
        let bucketer = TimeBucketer::from_name(&timezone)?;

        let options = ReportOptions::new(args.date_from, args.date_to, args.hourly)?;

        Ok(Self {
            cost_path: args
                .cost
                .clone()
                .or(file_config.input.cost)
                .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_COST_FILE)),
            revenue_path: args
                .revenue
                .clone()
                .or(file_config.input.revenue)
                .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_REVENUE_FILE)),
            out_path: args
                .out
                .clone()
                .or(file_config.output.path)
                .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_OUTPUT_FILE)),
            engine: args.engine.or(file_config.report.engine).unwrap_or_default(),
            options,
            bucketer,
        })
    }
}
