//! Relational report engine (SQLite)
//!
//! Loads the bucketed feeds into `cost_report` / `revenue_report` and derives
//! the whole report in one query. It shares only the [`TimeBucketer`] with the
//! procedural pipeline, so the two act as independent checks on each other.

use chrono::NaiveDate;
use sqlx::FromRow;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::bucketer::TimeBucketer;
use crate::constants;
use crate::error::{ReportError, Result};
use crate::pipeline::ReportOptions;
use crate::types::{HourlyColumns, JoinedBucket, RawCostRow, RawRevenueRow};

/// Daily report with optional hourly columns.
///
/// Amount sums are ordered explicitly (feed order within a day, hour order
/// for the hourly average) so they round like the procedural pipeline.
/// Aggregate `ORDER BY` needs SQLite 3.44 or later.
///
/// Binds: cost range (from, to), revenue range (from, to).
const REPORT_QUERY: &str = "
    WITH
    cost_rows AS (
        SELECT rowid AS seq, * FROM cost_report WHERE utc_day BETWEEN ? AND ?
    ),
    revenue_rows AS (
        SELECT rowid AS seq, * FROM revenue_report WHERE utc_day BETWEEN ? AND ?
    ),
    cost_daily AS (
        SELECT utc_day, campaign_id,
               MIN(campaign_name) AS campaign_name,
               SUM(cost ORDER BY seq) AS total_cost,
               SUM(clicks) AS total_clicks
        FROM cost_rows
        GROUP BY utc_day, campaign_id
    ),
    revenue_daily AS (
        SELECT utc_day, campaign_id, SUM(revenue ORDER BY seq) AS total_revenue
        FROM revenue_rows
        GROUP BY utc_day, campaign_id
    ),
    joined AS (
        SELECT COALESCE(c.utc_day, r.utc_day) AS utc_day,
               COALESCE(c.campaign_id, r.campaign_id) AS campaign_id,
               COALESCE(c.campaign_name, '') AS campaign_name,
               CAST(COALESCE(r.total_revenue, 0.0) AS REAL) AS total_revenue,
               CAST(COALESCE(c.total_cost, 0.0) AS REAL) AS total_cost,
               CAST(COALESCE(c.total_clicks, 0) AS INTEGER) AS total_clicks
        FROM cost_daily c
        FULL OUTER JOIN revenue_daily r
          ON c.utc_day = r.utc_day AND c.campaign_id = r.campaign_id
    ),
    cost_hourly AS (
        SELECT utc_hour, campaign_id, SUM(cost ORDER BY seq) AS hour_cost
        FROM cost_rows
        GROUP BY utc_hour, campaign_id
    ),
    revenue_hourly AS (
        SELECT utc_hour, campaign_id, SUM(revenue ORDER BY seq) AS hour_revenue
        FROM revenue_rows
        GROUP BY utc_hour, campaign_id
    ),
    hourly AS (
        SELECT COALESCE(c.utc_hour, r.utc_hour) AS utc_hour,
               substr(COALESCE(c.utc_hour, r.utc_hour), 1, 10) AS utc_day,
               COALESCE(c.campaign_id, r.campaign_id) AS campaign_id,
               COALESCE(c.hour_cost, 0.0) AS hour_cost,
               COALESCE(r.hour_revenue, 0.0) AS hour_revenue
        FROM cost_hourly c
        FULL OUTER JOIN revenue_hourly r
          ON c.utc_hour = r.utc_hour AND c.campaign_id = r.campaign_id
    ),
    hourly_daily AS (
        SELECT utc_day, campaign_id,
               AVG(hour_revenue ORDER BY utc_hour) AS hourly_avg_revenue,
               SUM(CASE WHEN hour_revenue - hour_cost > 0 THEN 1 ELSE 0 END) AS positive_profit_hours
        FROM hourly
        GROUP BY utc_day, campaign_id
    )
    SELECT j.utc_day AS utc_day,
           j.campaign_id AS campaign_id,
           j.campaign_name AS campaign_name,
           j.total_revenue AS total_revenue,
           j.total_cost AS total_cost,
           CAST(j.total_revenue - j.total_cost AS REAL) AS total_profit,
           j.total_clicks AS total_clicks,
           CASE WHEN j.total_clicks = 0 OR j.total_cost = 0 THEN NULL
                ELSE CAST((j.total_revenue / j.total_clicks) / (j.total_cost / j.total_clicks) AS REAL)
           END AS total_roi,
           CASE WHEN j.total_clicks = 0 THEN NULL
                ELSE CAST(j.total_cost / j.total_clicks AS REAL)
           END AS avg_cpc,
           CAST(h.hourly_avg_revenue AS REAL) AS hourly_avg_revenue,
           CAST(COALESCE(h.positive_profit_hours, 0) AS INTEGER) AS positive_profit_hours
    FROM joined j
    LEFT JOIN hourly_daily h
      ON h.utc_day = j.utc_day AND h.campaign_id = j.campaign_id
    ORDER BY j.utc_day, j.campaign_id
";

/// Row type for the report query
#[derive(FromRow)]
struct ReportRow {
    utc_day: String,
    campaign_id: String,
    campaign_name: String,
    total_revenue: f64,
    total_cost: f64,
    total_profit: f64,
    total_clicks: i64,
    total_roi: Option<f64>,
    avg_cpc: Option<f64>,
    hourly_avg_revenue: Option<f64>,
    positive_profit_hours: i64,
}

/// SQLite-backed report engine
pub struct SqlReportEngine {
    pool: SqlitePool,
}

impl SqlReportEngine {
    /// Open a private in-memory database and create the feed tables
    pub async fn open() -> Result<Self> {
        // One long-lived connection: every in-memory connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(constants::SQLITE_MEMORY_URL)
            .await?;

        let engine = Self { pool };
        engine.init_schema().await?;
        Ok(engine)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "
            -- One row per cost feed row, already bucketed to UTC
            CREATE TABLE IF NOT EXISTS cost_report (
                utc_day TEXT NOT NULL,
                utc_hour TEXT NOT NULL,
                campaign_id TEXT NOT NULL,
                campaign_name TEXT,
                clicks INTEGER NOT NULL,
                cost REAL NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "
            -- One row per revenue feed row, already bucketed to UTC
            CREATE TABLE IF NOT EXISTS revenue_report (
                utc_day TEXT NOT NULL,
                utc_hour TEXT NOT NULL,
                campaign_id TEXT NOT NULL,
                revenue REAL NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replace the table contents with the given feeds
    pub async fn load(
        &self,
        cost_rows: &[RawCostRow],
        revenue_rows: &[RawRevenueRow],
        bucketer: &TimeBucketer,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cost_report").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM revenue_report").execute(&mut *tx).await?;

        for row in cost_rows {
            let hour = bucketer.to_utc_hour_bucket(row.local_timestamp)?;
            let clicks = i64::try_from(row.clicks).map_err(|_| ReportError::ClickOverflow {
                campaign_id: row.campaign_id.clone(),
                utc_day: hour.format(constants::SQL_DAY_FORMAT).to_string(),
            })?;
            // Empty names are NULL so MIN() skips them
            let name = (!row.campaign_name.is_empty()).then_some(row.campaign_name.as_str());

            sqlx::query(
                "INSERT INTO cost_report
                 (utc_day, utc_hour, campaign_id, campaign_name, clicks, cost)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(hour.format(constants::SQL_DAY_FORMAT).to_string())
            .bind(hour.format(constants::SQL_HOUR_FORMAT).to_string())
            .bind(&row.campaign_id)
            .bind(name)
            .bind(clicks)
            .bind(row.cost)
            .execute(&mut *tx)
            .await?;
        }

        for row in revenue_rows {
            let hour = bucketer.to_utc_hour_bucket(row.local_timestamp)?;

            sqlx::query(
                "INSERT INTO revenue_report (utc_day, utc_hour, campaign_id, revenue)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(hour.format(constants::SQL_DAY_FORMAT).to_string())
            .bind(hour.format(constants::SQL_HOUR_FORMAT).to_string())
            .bind(&row.campaign_id)
            .bind(row.revenue)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(
            cost_rows = cost_rows.len(),
            revenue_rows = revenue_rows.len(),
            "loaded feeds into sqlite"
        );
        Ok(())
    }

    /// Run the report query over the loaded feeds
    pub async fn query(&self, options: &ReportOptions) -> Result<Vec<JoinedBucket>> {
        let from = options.date_from.format(constants::SQL_DAY_FORMAT).to_string();
        let to = options.date_to.format(constants::SQL_DAY_FORMAT).to_string();

        let rows: Vec<ReportRow> = sqlx::query_as(REPORT_QUERY)
            .bind(&from)
            .bind(&to)
            .bind(&from)
            .bind(&to)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| row_to_bucket(row, options.hourly))
            .collect()
    }
}

/// Load both feeds into a fresh engine and run the report query
pub async fn build_report_sql(
    cost_rows: &[RawCostRow],
    revenue_rows: &[RawRevenueRow],
    options: &ReportOptions,
    bucketer: &TimeBucketer,
) -> Result<Vec<JoinedBucket>> {
    let engine = SqlReportEngine::open().await?;
    engine.load(cost_rows, revenue_rows, bucketer).await?;
    engine.query(options).await
}

fn row_to_bucket(row: ReportRow, hourly: bool) -> Result<JoinedBucket> {
    let utc_day =
        NaiveDate::parse_from_str(&row.utc_day, constants::SQL_DAY_FORMAT).map_err(decode_error)?;
    let total_clicks = u64::try_from(row.total_clicks).map_err(decode_error)?;
    let positive_profit_hours = u32::try_from(row.positive_profit_hours).map_err(decode_error)?;

    Ok(JoinedBucket {
        utc_day,
        campaign_id: row.campaign_id,
        campaign_name: row.campaign_name,
        total_revenue: row.total_revenue,
        total_cost: row.total_cost,
        total_clicks,
        total_profit: row.total_profit,
        total_roi: row.total_roi,
        avg_cpc: row.avg_cpc,
        hourly: hourly.then_some(HourlyColumns {
            hourly_avg_revenue: row.hourly_avg_revenue,
            positive_profit_hours,
        }),
    })
}

fn decode_error(e: impl std::error::Error + Send + Sync + 'static) -> ReportError {
    ReportError::Database(sqlx::Error::Decode(Box::new(e)))
}
