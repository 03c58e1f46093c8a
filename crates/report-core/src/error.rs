//! Error types for the report engine

use thiserror::Error;

/// Errors raised while bucketing, aggregating or querying report data.
///
/// Division by zero is not an error: ratio columns degrade to the missing-value
/// marker instead. DST folds and gaps are resolved, never reported.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("malformed {feed} input at line {line}: {detail}")]
    MalformedInput {
        feed: &'static str,
        line: u64,
        detail: String,
    },

    #[error("local time {0} could not be resolved in the source timezone")]
    UnresolvableLocalTime(String),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("click total for campaign {campaign_id} on {utc_day} exceeds the supported range")]
    ClickOverflow { campaign_id: String, utc_day: String },

    #[error("invalid date range: {from} is after {to}")]
    InvalidRange { from: String, to: String },

    #[error("report database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
