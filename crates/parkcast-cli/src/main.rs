//! parkcast - parking occupancy collector and forecaster
//!
//! - `collect`: fetch the open-data document and load it into the warehouse
//! - `train`: forecast free spaces from the stored history
//! - `normalize`: print the rows a saved document would produce

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use parkcast_cli::{CollectJob, CollectOutcome, TrainJob, TrainSettings};
use parkcast_config::AppConfig;
use parkcast_core::{truncate_to_second, Timestamp};
use parkcast_db::{DbClient, WarehouseTables};
use parkcast_forecast::ModelPolicy;
use parkcast_ingest::{normalize, DocumentSource, FetchPolicy, FileSource, HttpFetcher};
use parkcast_sinks::{write_csv, FsBlobStore, MetricsLog};

#[derive(Parser)]
#[command(name = "parkcast", version, about = "Parking occupancy collector and forecaster")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the current readings and load them into the warehouse
    Collect,
    /// Train on the stored history and write the forecast
    Train,
    /// Normalize a saved document and print the staged CSV to stdout
    Normalize {
        file: PathBuf,
        /// Timestamp for the rows (default: now)
        #[arg(long)]
        at: Option<Timestamp>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    parkcast_obs::init("parkcast", cli.json_logs);

    match cli.command {
        Command::Collect => collect(&load_config()?).await,
        Command::Train => train(&load_config()?).await,
        Command::Normalize { file, at } => normalize_file(file, at).await,
    }
}

fn load_config() -> Result<AppConfig> {
    let cfg = AppConfig::load().context("Failed to load configuration")?;
    info!(
        source = %cfg.source.url,
        project = %cfg.warehouse.project,
        dataset = %cfg.warehouse.dataset,
        "Loaded configuration"
    );
    Ok(cfg)
}

async fn connect(cfg: &AppConfig) -> Result<Arc<DbClient>> {
    let warehouse = &cfg.warehouse;
    let tables = WarehouseTables::new(&warehouse.project, &warehouse.dataset)?.with_names(
        &warehouse.raw_table,
        &warehouse.metrics_table,
        &warehouse.predictions_table,
    )?;
    let client = DbClient::new(cfg.database_url()?, tables)
        .await
        .context("Failed to connect to database")?;
    client.ping().await.context("Database ping failed")?;
    Ok(Arc::new(client))
}

async fn collect(cfg: &AppConfig) -> Result<()> {
    let policy = FetchPolicy {
        max_retries: cfg.source.max_retries,
        timeout: std::time::Duration::from_secs(cfg.source.timeout_secs),
        backoff_base: std::time::Duration::from_secs(cfg.source.backoff_secs),
    };
    let source = Arc::new(HttpFetcher::new(cfg.source.url.clone(), policy)?);
    let blobs = Arc::new(FsBlobStore::new(&cfg.storage.bucket_dir)?);
    let db = connect(cfg).await?;

    let job = CollectJob::new(source, db.clone(), db, blobs, &cfg.storage.data_dir);
    match job.run(Utc::now()).await? {
        CollectOutcome::Loaded { rows, uri } => {
            info!(rows, %uri, "Collection finished");
        }
        CollectOutcome::RawDumped(path) => {
            info!(path = %path.display(), "Collection produced no rows");
        }
    }
    Ok(())
}

async fn train(cfg: &AppConfig) -> Result<()> {
    let settings = TrainSettings {
        horizon: cfg.forecast.horizon,
        lookback: (cfg.forecast.lookback_days > 0)
            .then(|| Duration::days(i64::from(cfg.forecast.lookback_days))),
        policy: ModelPolicy {
            min_seasonal_points: cfg.forecast.min_seasonal_points,
        },
    };
    let metrics_log = MetricsLog::new(&cfg.storage.monitoring_dir)?;
    let db = connect(cfg).await?;

    let job = TrainJob::new(db.clone(), db.clone(), db, metrics_log, settings);
    let result = job.run(truncate_to_second(Utc::now())).await?;
    info!(
        mae = result.mae,
        model = %result.model_desc,
        "Training finished"
    );
    Ok(())
}

async fn normalize_file(file: PathBuf, at: Option<Timestamp>) -> Result<()> {
    let source = FileSource::new(&file);
    let document = source.fetch().await?;
    let observed_at = truncate_to_second(at.unwrap_or_else(Utc::now));
    let rows = normalize(&document, observed_at);
    info!(rows = rows.len(), file = %file.display(), "Normalized document");
    write_csv(std::io::stdout().lock(), &rows)
}
