//! Centralized constants for the report engine

// =============================================================================
// Time Handling
// =============================================================================

/// IANA zone the feeds are recorded in (EST/EDT)
pub const SOURCE_TIMEZONE: &str = "America/New_York";

/// Wall-clock timestamp format used by both feeds (e.g. "12/31/18 19:00")
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M";

/// Upper bound when shifting a nonexistent local time past a DST gap
pub const MAX_GAP_MINUTES: i64 = 24 * 60;

// =============================================================================
// Limits
// =============================================================================

/// Largest click count, per row or per bucket (SQLite INTEGER range)
pub const MAX_CLICKS: u64 = i64::MAX as u64;

// =============================================================================
// Relational Engine
// =============================================================================

/// In-memory SQLite database used by the relational engine
pub const SQLITE_MEMORY_URL: &str = "sqlite::memory:";

/// Text form of a UTC day bucket inside SQLite (sorts chronologically)
pub const SQL_DAY_FORMAT: &str = "%Y-%m-%d";

/// Text form of a UTC hour bucket inside SQLite
pub const SQL_HOUR_FORMAT: &str = "%Y-%m-%d %H:00:00";
