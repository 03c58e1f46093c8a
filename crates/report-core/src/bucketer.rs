//! Local wall-clock time to UTC day/hour buckets
//!
//! Feed timestamps carry no offset. They are resolved against the source
//! zone's offset history, converted to UTC and truncated. DST handling:
//! - fold (local time occurs twice): the earliest instant wins
//! - gap (local time never occurs): shifted forward to the first valid minute

use chrono::{
    DateTime, DurationRound, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;
use tracing::trace;

use crate::constants;
use crate::error::{ReportError, Result};

/// Converts source-timezone timestamps into UTC buckets
#[derive(Debug, Clone, Copy)]
pub struct TimeBucketer {
    tz: Tz,
}

impl Default for TimeBucketer {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
        }
    }
}

impl TimeBucketer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build a bucketer from an IANA zone name such as "America/New_York"
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| ReportError::UnknownTimezone(name.to_string()))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Parse a feed timestamp ("01/15/19 23:30")
    pub fn parse_local(text: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(text.trim(), constants::LOCAL_TIMESTAMP_FORMAT)
    }

    /// Resolve a local wall-clock time to the UTC instant it denotes
    pub fn to_utc(&self, local: NaiveDateTime) -> Result<DateTime<Utc>> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => {
                trace!(%local, "ambiguous local time, taking earliest offset");
                Ok(earliest.with_timezone(&Utc))
            }
            LocalResult::None => self.shift_past_gap(local),
        }
    }

    /// UTC calendar day containing the local timestamp
    pub fn to_utc_day_bucket(&self, local: NaiveDateTime) -> Result<NaiveDate> {
        Ok(self.to_utc(local)?.date_naive())
    }

    /// Start of the UTC hour containing the local timestamp
    pub fn to_utc_hour_bucket(&self, local: NaiveDateTime) -> Result<DateTime<Utc>> {
        self.to_utc(local)?
            .duration_trunc(TimeDelta::hours(1))
            .map_err(|_| ReportError::UnresolvableLocalTime(local.to_string()))
    }

    fn shift_past_gap(&self, local: NaiveDateTime) -> Result<DateTime<Utc>> {
        let start = local
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(local);

        let resolved = (1..=constants::MAX_GAP_MINUTES)
            .filter_map(|m| start.checked_add_signed(TimeDelta::minutes(m)))
            .find_map(|candidate| self.tz.from_local_datetime(&candidate).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| ReportError::UnresolvableLocalTime(local.to_string()))?;

        trace!(%local, %resolved, "nonexistent local time shifted forward");
        Ok(resolved)
    }
}
