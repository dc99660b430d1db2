use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use order_analysis_etl as etl;
use etl::artifacts::ArtifactStore;
use etl::stages::{self, StageOutcome};

/// Daily batch ETL for order analysis: extracts orders, customers, and
/// products from the remote API and loads the joined result into the
/// final store. Invoked once per partition date by the orchestrator.
#[derive(Debug, Parser)]
#[command(name = "order-etl", version, about)]
struct Cli {
    /// Partition date to process (YYYY-MM-DD); defaults to today (UTC)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full Extract -> Transform -> Load pipeline for one date
    Run,
    /// Run only the extract stage
    Extract,
    /// Run only the transform stage
    Transform,
    /// Run only the load stage
    Load,
    /// Ensure the destination schema exists, then exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = etl::config::load_config()?;
    etl::config::init_tracing(cfg.log_level(), cfg.log_json);

    let date = cli.date.unwrap_or_else(|| Utc::now().date_naive());
    info!(date = %date, "starting order-etl");

    let db = etl::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the final store")?;
    if cfg.auto_migrate {
        etl::db::run_migrations(&db).await.map_err(|e| {
            error!("Failed ensuring destination schema: {}", e);
            e
        })?;
    }

    let store = ArtifactStore::new(&cfg.data_dir);

    match cli.command {
        Command::Run => {
            let report = stages::run_pipeline(&cfg, &db, date).await?;
            report_outcome("extract", &report.extract);
            report_outcome("transform", &report.transform);
            report_outcome("load", &report.load);
        }
        Command::Extract => {
            let client = etl::ApiClient::from_config(&cfg)?;
            let outcome = stages::extract::extract(&client, &store, date).await?;
            report_outcome("extract", &outcome);
        }
        Command::Transform => {
            let outcome = stages::transform::transform(&store, date)?;
            report_outcome("transform", &outcome);
        }
        Command::Load => {
            let outcome = stages::load::load(&db, &store, date, cfg.load_batch_size).await?;
            report_outcome("load", &outcome);
        }
        Command::Migrate => {
            etl::db::run_migrations(&db).await?;
            info!("destination schema ensured");
        }
    }

    Ok(())
}

fn report_outcome(stage: &str, outcome: &StageOutcome) {
    match outcome {
        StageOutcome::Completed { rows } => println!("{stage}: completed ({rows} rows)"),
        StageOutcome::Skipped { reason } => println!("{stage}: skipped ({reason})"),
    }
}
