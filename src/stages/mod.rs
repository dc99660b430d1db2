pub mod extract;
pub mod load;
pub mod transform;

use chrono::NaiveDate;
use std::time::Instant;
use tracing::info;

use crate::api_client::ApiClient;
use crate::artifacts::ArtifactStore;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::EtlError;

/// Result of one stage for one partition date.
///
/// A skip is a clean, intentional outcome (missing or empty input), not a
/// failure; it propagates downstream as further skips and must never alarm
/// the orchestrator. Hard failures travel as `Err(EtlError)` instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Completed { rows: usize },
    Skipped { reason: String },
}

impl StageOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped { .. })
    }

    pub fn rows(&self) -> usize {
        match self {
            StageOutcome::Completed { rows } => *rows,
            StageOutcome::Skipped { .. } => 0,
        }
    }
}

/// Per-date summary of one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    pub date: NaiveDate,
    pub extract: StageOutcome,
    pub transform: StageOutcome,
    pub load: StageOutcome,
}

/// Runs Extract -> Transform -> Load for one partition date.
///
/// Strictly sequential: no stage starts before its predecessor's output is
/// materialized. Stage skips are logged and carried forward; any hard error
/// aborts the run so the orchestrator sees a failed task.
pub async fn run_pipeline(
    cfg: &AppConfig,
    db: &DbPool,
    date: NaiveDate,
) -> Result<PipelineReport, EtlError> {
    let store = ArtifactStore::new(&cfg.data_dir);
    let client = ApiClient::from_config(cfg)?;

    let started = Instant::now();
    let extract = extract::extract(&client, &store, date).await?;
    log_stage("extract", &extract, started);

    let started = Instant::now();
    let transform = transform::transform(&store, date)?;
    log_stage("transform", &transform, started);

    let started = Instant::now();
    let load = load::load(db, &store, date, cfg.load_batch_size).await?;
    log_stage("load", &load, started);

    Ok(PipelineReport {
        date,
        extract,
        transform,
        load,
    })
}

fn log_stage(stage: &str, outcome: &StageOutcome, started: Instant) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match outcome {
        StageOutcome::Completed { rows } => {
            info!(stage, rows, elapsed_ms, "stage completed");
        }
        StageOutcome::Skipped { reason } => {
            info!(stage, reason = reason.as_str(), elapsed_ms, "stage skipped");
        }
    }
}
