//! Short-horizon forecasting over the hourly free-spaces series
//!
//! Two strategies are available: an hour-of-day mean baseline for sparse
//! histories and a seasonal ARIMA with daily period once enough data has
//! accumulated. [`Forecaster`] picks between them.

pub mod baseline;
pub mod metrics;
mod optimizer;
pub mod sarimax;
pub mod selector;

pub use baseline::*;
pub use metrics::*;
pub use sarimax::*;
pub use selector::*;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Insufficient data: need {required} points, have {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid horizon: {0}")]
    InvalidHorizon(usize),

    #[error("Input contains non-finite values")]
    NonFiniteInput,
}

pub type ModelResult<T> = Result<T, ModelError>;

/// A seasonal model treated as an opaque capability: fit on a series of
/// hourly values, then forecast `steps` values past its end.
pub trait SeasonalModel: Send + Sync {
    /// Identifying string stored alongside results
    fn description(&self) -> String;

    /// Fewest points `fit_predict` accepts
    fn min_observations(&self) -> usize;

    fn fit_predict(&self, values: &[f64], steps: usize) -> ModelResult<Vec<f64>>;
}
