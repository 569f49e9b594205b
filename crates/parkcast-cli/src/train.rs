//! Trainer job: read the hourly aggregate, forecast, store results

use anyhow::{Context, Result};
use chrono::Duration;
use parkcast_core::{ForecastResult, Provisioner, ReadingStore, ResultStore, Timestamp};
use parkcast_forecast::{Forecaster, ModelPolicy};
use parkcast_series::SeriesBuilder;
use parkcast_sinks::MetricsLog;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct TrainSettings {
    pub horizon: usize,
    /// History window; `None` reads everything
    pub lookback: Option<Duration>,
    pub policy: ModelPolicy,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            horizon: 24,
            lookback: Some(Duration::days(7)),
            policy: ModelPolicy::default(),
        }
    }
}

pub struct TrainJob {
    provisioner: Arc<dyn Provisioner>,
    readings: Arc<dyn ReadingStore>,
    results: Arc<dyn ResultStore>,
    metrics_log: MetricsLog,
    settings: TrainSettings,
}

impl TrainJob {
    pub fn new(
        provisioner: Arc<dyn Provisioner>,
        readings: Arc<dyn ReadingStore>,
        results: Arc<dyn ResultStore>,
        metrics_log: MetricsLog,
        settings: TrainSettings,
    ) -> Self {
        Self {
            provisioner,
            readings,
            results,
            metrics_log,
            settings,
        }
    }

    /// One training run tagged with `run_at`
    pub async fn run(&self, run_at: Timestamp) -> Result<ForecastResult> {
        self.provisioner.ensure_schema().await?;

        let mut builder = SeriesBuilder::new().as_of(run_at);
        if let Some(lookback) = self.settings.lookback {
            builder = builder.lookback(lookback);
        }
        let totals = self.readings.hourly_totals(builder.cutoff()).await?;
        let series = builder
            .build_from_totals(&totals)
            .context("No readings to train on")?;

        let forecaster = Forecaster::new(self.settings.policy);
        let result = forecaster
            .forecast(&series, self.settings.horizon, run_at)
            .context("Forecasting failed")?;

        self.results.append_result(&result).await?;
        self.metrics_log.append(&result)?;

        info!(
            model = %result.model_desc,
            mae = result.mae,
            train_points = result.train_points,
            "training run stored"
        );
        Ok(result)
    }
}
