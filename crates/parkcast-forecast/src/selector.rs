//! Chooses a strategy from data volume and produces the run's result

use crate::baseline::{HourOfDayBaseline, BASELINE_DESC};
use crate::metrics::mean_absolute_error;
use crate::sarimax::Sarimax;
use crate::{ModelError, ModelResult, SeasonalModel};
use parkcast_core::{ForecastPoint, ForecastResult, HourlySeries, Timestamp};
use tracing::{info, warn};

/// Which strategy a series qualifies for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    HourOfDayBaseline,
    Seasonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelPolicy {
    /// Effective points below which the baseline is used
    pub min_seasonal_points: usize,
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self {
            min_seasonal_points: 24,
        }
    }
}

pub struct Forecaster<M = Sarimax> {
    policy: ModelPolicy,
    seasonal: M,
}

impl Forecaster<Sarimax> {
    pub fn new(policy: ModelPolicy) -> Self {
        Self::with_model(policy, Sarimax::default())
    }
}

impl<M: SeasonalModel> Forecaster<M> {
    pub fn with_model(policy: ModelPolicy, seasonal: M) -> Self {
        Self { policy, seasonal }
    }

    pub fn select(&self, series: &HourlySeries) -> Strategy {
        if series.effective_points() < self.policy.min_seasonal_points {
            Strategy::HourOfDayBaseline
        } else {
            Strategy::Seasonal
        }
    }

    /// Forecast `horizon` hours past the end of `series`
    pub fn forecast(
        &self,
        series: &HourlySeries,
        horizon: usize,
        run_at: Timestamp,
    ) -> ModelResult<ForecastResult> {
        if horizon == 0 {
            return Err(ModelError::InvalidHorizon(horizon));
        }

        let strategy = self.select(series);
        info!(
            ?strategy,
            effective = series.effective_points(),
            hours = series.len(),
            horizon,
            "selected forecasting strategy"
        );

        if strategy == Strategy::Seasonal {
            if let Some(result) = self.seasonal_forecast(series, horizon, run_at)? {
                return Ok(result);
            }
        }
        Ok(baseline_forecast(series, horizon, run_at))
    }

    /// `None` when the series is too short for the seasonal model
    fn seasonal_forecast(
        &self,
        series: &HourlySeries,
        horizon: usize,
        run_at: Timestamp,
    ) -> ModelResult<Option<ForecastResult>> {
        let values = series.values();
        let train_len = values.len().saturating_sub(horizon);
        let required = self.seasonal.min_observations();
        if train_len < required {
            warn!(
                train_len,
                required, "series too short for the seasonal model, using baseline"
            );
            return Ok(None);
        }

        let (train, holdout) = values.split_at(train_len);
        let tail = match self.seasonal.fit_predict(train, holdout.len()) {
            Ok(tail) => tail,
            Err(ModelError::InsufficientData { required, actual }) => {
                warn!(required, actual, "seasonal fit rejected the training slice, using baseline");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let mae = mean_absolute_error(holdout, &tail);

        let future = self.seasonal.fit_predict(values, horizon)?;
        Ok(Some(ForecastResult {
            run_at,
            model_desc: self.seasonal.description(),
            mae,
            train_points: series.effective_points(),
            forecast_points: to_points(series.future_timestamps(horizon), future),
        }))
    }
}

fn baseline_forecast(series: &HourlySeries, horizon: usize, run_at: Timestamp) -> ForecastResult {
    let baseline = HourOfDayBaseline::fit(series);
    let timestamps = series.future_timestamps(horizon);
    let values = timestamps
        .iter()
        .map(|at| baseline.predict_at(*at).unwrap_or(f64::NAN))
        .collect();

    ForecastResult {
        run_at,
        model_desc: BASELINE_DESC.to_string(),
        mae: baseline.holdout_mae(series, horizon),
        train_points: series.effective_points(),
        forecast_points: to_points(timestamps, values),
    }
}

/// Pair timestamps with values, surfacing non-finite values as `None`
fn to_points(timestamps: Vec<Timestamp>, values: Vec<f64>) -> Vec<ForecastPoint> {
    timestamps
        .into_iter()
        .zip(values)
        .map(|(at, v)| ForecastPoint {
            at,
            value: v.is_finite().then_some(v),
        })
        .collect()
}
