//! Campaign performance report
//!
//! Reads a cost/clicks feed and a revenue feed recorded in local time and
//! writes one row per UTC day and campaign with profit, ROI and average CPC.

mod config;
mod constants;
mod ingest;
mod output;

use anyhow::Result;
use campaign_report_core::parity::report_mismatches;
use campaign_report_core::{JoinedBucket, RawCostRow, RawRevenueRow, build_report, build_report_sql};
use clap::Parser;
use tracing::{debug, info, warn};

use config::{Args, Config, Engine, FileConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let file_config = FileConfig::resolve(args.config.as_deref())?;
    let config = Config::from_args(&args, file_config)?;
    debug!(?config, "resolved configuration");

    run(&config).await
}

/// Load both feeds, build the report and write it out
async fn run(config: &Config) -> Result<()> {
    println!("Loading cost feed from {}...", config.cost_path.display());
    let cost_rows = ingest::load_cost_rows(&config.cost_path)?;
    println!("  Loaded {} cost rows\n", cost_rows.len());

    println!("Loading revenue feed from {}...", config.revenue_path.display());
    let revenue_rows = ingest::load_revenue_rows(&config.revenue_path)?;
    println!("  Loaded {} revenue rows\n", revenue_rows.len());

    println!(
        "Building report for {} to {} (UTC, {}{})...",
        config.options.date_from,
        config.options.date_to,
        config.bucketer.timezone(),
        if config.options.hourly { ", hourly" } else { "" }
    );
    let report = compute(config, &cost_rows, &revenue_rows).await?;

    let rows = output::write_report(&config.out_path, &report, config.options.hourly)?;
    println!("Wrote {} ({} rows)", config.out_path.display(), rows);

    Ok(())
}

/// Run the configured engine(s)
async fn compute(
    config: &Config,
    cost_rows: &[RawCostRow],
    revenue_rows: &[RawRevenueRow],
) -> Result<Vec<JoinedBucket>> {
    let procedural = || build_report(cost_rows, revenue_rows, &config.options, &config.bucketer);
    let relational = || build_report_sql(cost_rows, revenue_rows, &config.options, &config.bucketer);

    match config.engine {
        Engine::Procedural => Ok(procedural()?),
        Engine::Sql => Ok(relational().await?),
        Engine::Both => {
            let procedural = procedural()?;
            let relational = relational().await?;

            let mismatches = report_mismatches(&procedural, &relational);
            if !mismatches.is_empty() {
                for mismatch in mismatches.iter().take(constants::MAX_REPORTED_MISMATCHES) {
                    warn!("{}", mismatch);
                }
                anyhow::bail!(
                    "procedural and sql engines disagree ({} difference(s))",
                    mismatches.len()
                );
            }

            info!(rows = procedural.len(), "procedural and sql engines agree");
            Ok(procedural)
        }
    }
}

/// Initialize tracing subscriber; RUST_LOG overrides the verbosity flag
fn init_tracing(verbose: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow::anyhow!("Failed to initialize log filter: {}", e))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const COST_FEED: &str = "data_date,campaign_id,campaign_name,clicks,cost\n\
        01/15/19 23:30,7,Spring,10,5.00\n\
        01/16/19 05:00,9,Quiet,0,0\n\
        03/10/19 02:30,7,Spring,2,1.00\n\
        11/03/19 01:30,7,Spring,2,1.00\n";

    const REVENUE_FEED: &str = "data_date,campaign_id,revenue\n\
        01/16/19 08:00,7,20.00\n\
        01/16/19 05:00,9,30.00\n\
        01/16/19 12:00,11,2.50\n\
        11/03/19 01:45,7,0.25\n";

    const CENTS_COST_FEED: &str = "data_date,campaign_id,campaign_name,clicks,cost\n\
        01/16/19 09:05,7,Spring,3,0.10\n\
        01/16/19 09:20,7,Spring,3,0.20\n\
        01/16/19 09:40,7,Spring,3,0.30\n\
        01/16/19 10:10,7,Spring,2,0.70\n\
        01/16/19 10:50,8,Autumn,3,0.15\n\
        01/16/19 11:00,8,Autumn,3,0.35\n\
        01/16/19 11:20,8,Autumn,1,0.05\n\
        01/17/19 14:00,8,Autumn,7,1.10\n\
        01/17/19 14:15,8,Autumn,7,2.20\n";

    const CENTS_REVENUE_FEED: &str = "data_date,campaign_id,revenue\n\
        01/16/19 09:10,7,0.70\n\
        01/16/19 09:30,7,0.10\n\
        01/16/19 09:45,7,0.20\n\
        01/16/19 12:00,7,1.10\n\
        01/16/19 12:30,7,0.30\n\
        01/16/19 10:55,8,0.33\n\
        01/16/19 11:30,8,0.01\n\
        01/16/19 11:31,8,2.20\n\
        01/17/19 14:40,8,3.30\n\
        01/17/19 18:00,9,0.10\n\
        01/17/19 18:05,9,0.20\n";

    fn write_feeds(dir: &TempDir, cost_feed: &str, revenue_feed: &str) -> (PathBuf, PathBuf) {
        let cost = dir.path().join("cost.csv");
        let revenue = dir.path().join("revenue.csv");
        std::fs::write(&cost, cost_feed).unwrap();
        std::fs::write(&revenue, revenue_feed).unwrap();
        (cost, revenue)
    }

    fn config_for(dir: &TempDir, engine: &str, hourly: bool, out: &str) -> Config {
        config_with_feeds(dir, (COST_FEED, REVENUE_FEED), engine, hourly, out)
    }

    fn config_with_feeds(
        dir: &TempDir,
        (cost_feed, revenue_feed): (&str, &str),
        engine: &str,
        hourly: bool,
        out: &str,
    ) -> Config {
        let (cost, revenue) = write_feeds(dir, cost_feed, revenue_feed);
        let out = dir.path().join(out);
        let mut argv = vec![
            "campaign-report".to_string(),
            "--cost".to_string(),
            cost.display().to_string(),
            "--revenue".to_string(),
            revenue.display().to_string(),
            "--out".to_string(),
            out.display().to_string(),
            "--date-from".to_string(),
            "2019-01-01".to_string(),
            "--date-to".to_string(),
            "2019-12-31".to_string(),
            "--engine".to_string(),
            engine.to_string(),
        ];
        if hourly {
            argv.push("--hourly".to_string());
        }
        let args = Args::try_parse_from(argv).unwrap();
        Config::from_args(&args, FileConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_daily_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir, "procedural", false, "report.csv");

        run(&config).await.unwrap();

        let content = std::fs::read_to_string(&config.out_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "date,campaign_id,campaign_name,total_revenue,total_cost,total_profit,total_clicks,total_roi,avg_cpc",
                "2019/01/16,11,,2.5,0.0,2.5,0,,",
                "2019/01/16,7,Spring,20.0,5.0,15.0,10,4.0,0.5",
                "2019/01/16,9,Quiet,30.0,0.0,30.0,0,,",
                "2019/03/10,7,Spring,0.0,1.0,-1.0,2,0.0,0.5",
                "2019/11/03,7,Spring,0.25,1.0,-0.75,2,0.25,0.5",
            ]
        );
    }

    #[tokio::test]
    async fn test_engines_produce_identical_files() {
        let dir = tempfile::tempdir().unwrap();
        let procedural = config_for(&dir, "procedural", true, "procedural.csv");
        let sql = config_for(&dir, "sql", true, "sql.csv");

        run(&procedural).await.unwrap();
        run(&sql).await.unwrap();

        let a = std::fs::read(&procedural.out_path).unwrap();
        let b = std::fs::read(&sql.out_path).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_engines_write_identical_cent_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let feeds = (CENTS_COST_FEED, CENTS_REVENUE_FEED);

        for hourly in [false, true] {
            let procedural = config_with_feeds(&dir, feeds, "procedural", hourly, "procedural.csv");
            let sql = config_with_feeds(&dir, feeds, "sql", hourly, "sql.csv");

            run(&procedural).await.unwrap();
            run(&sql).await.unwrap();

            let a = std::fs::read_to_string(&procedural.out_path).unwrap();
            let b = std::fs::read_to_string(&sql.out_path).unwrap();
            assert_eq!(a, b);
            assert!(a.contains("2019/01/16,7,Spring,2.4,1.3,1.0999999999999999,11,"));
        }

        let both = config_with_feeds(&dir, feeds, "both", true, "both.csv");
        run(&both).await.unwrap();
    }

    #[tokio::test]
    async fn test_both_engines_agree() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir, "both", true, "report.csv");
        run(&config).await.unwrap();

        let content = std::fs::read_to_string(&config.out_path).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.ends_with("hourly_avg_revenue,positive_profit_hours"));
        assert!(content.contains("2019/01/16,7,Spring,20.0,5.0,15.0,10,4.0,0.5,10.0,1"));
    }

    #[tokio::test]
    async fn test_rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let first = config_for(&dir, "procedural", true, "first.csv");
        let second = config_for(&dir, "procedural", true, "second.csv");

        run(&first).await.unwrap();
        run(&second).await.unwrap();

        assert_eq!(
            std::fs::read(&first.out_path).unwrap(),
            std::fs::read(&second.out_path).unwrap()
        );
    }

    #[tokio::test]
    async fn test_malformed_feed_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir, "procedural", false, "report.csv");
        std::fs::write(&config.revenue_path, "data_date,campaign_id,revenue\nyesterday,7,1\n").unwrap();

        assert!(run(&config).await.is_err());
        assert!(!config.out_path.exists());
    }
}
