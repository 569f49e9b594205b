//! Hour-of-day mean baseline for sparse histories

use crate::metrics::mean_absolute_error;
use chrono::Timelike;
use parkcast_core::{Accumulator, AggregateType, HourlySeries, Timestamp};

/// Identifier stored with results produced by the baseline
pub const BASELINE_DESC: &str = "hour_of_day_mean";

/// Span of the moving average used for hours never observed
pub const EWMA_SPAN: f64 = 12.0;

/// Mean observed value per hour of day, with an EWMA fallback
#[derive(Debug, Clone, PartialEq)]
pub struct HourOfDayBaseline {
    means: [Option<f64>; 24],
    fallback: Option<f64>,
}

impl HourOfDayBaseline {
    /// Learn hour-of-day means from the observed (not filled) points
    pub fn fit(series: &HourlySeries) -> Self {
        let mut by_hour: [Accumulator; 24] =
            std::array::from_fn(|_| Accumulator::new(AggregateType::Avg));
        for (at, value, observed) in series.iter() {
            if observed {
                by_hour[at.hour() as usize].add(value);
            }
        }

        Self {
            means: std::array::from_fn(|h| by_hour[h].result()),
            fallback: ewma(series.values(), EWMA_SPAN),
        }
    }

    pub fn mean_for_hour(&self, hour: u32) -> Option<f64> {
        self.means.get(hour as usize).copied().flatten()
    }

    /// Prediction for the hour containing `at`
    pub fn predict_at(&self, at: Timestamp) -> Option<f64> {
        self.mean_for_hour(at.hour()).or(self.fallback)
    }

    /// MAE of the baseline over the most recent observed points.
    ///
    /// The tail is the last `min(horizon, max(1, effective / 5))` observed
    /// points; filled hours never count toward it.
    pub fn holdout_mae(&self, series: &HourlySeries, horizon: usize) -> f64 {
        let tail = holdout_len(series.effective_points(), horizon);
        let observed: Vec<(Timestamp, f64)> = series
            .iter()
            .filter(|(_, _, observed)| *observed)
            .map(|(at, value, _)| (at, value))
            .collect();
        let recent = &observed[observed.len().saturating_sub(tail)..];
        let (actual, predicted): (Vec<f64>, Vec<f64>) = recent
            .iter()
            .map(|&(at, value)| (value, self.predict_at(at).unwrap_or(f64::NAN)))
            .unzip();
        mean_absolute_error(&actual, &predicted)
    }
}

pub fn holdout_len(effective_points: usize, horizon: usize) -> usize {
    horizon.min((effective_points / 5).max(1))
}

/// Exponentially weighted mean of `values` with the given span,
/// weighting older points by `(1 - alpha)^age`, `alpha = 2 / (span + 1)`.
pub fn ewma(values: &[f64], span: f64) -> Option<f64> {
    let alpha = 2.0 / (span + 1.0);
    let (num, den) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0.0), |(num, den), v| {
            (num * (1.0 - alpha) + v, den * (1.0 - alpha) + 1.0)
        });
    (den > 0.0).then(|| num / den)
}
