//! Warehouse table layout
//!
//! Column names match the staged CSV header so a row can move from file to
//! table without renaming.

use crate::{DbError, DbResult};
use chrono::{DateTime, Utc};
use parkcast_core::{ForecastResult, HourlyTotal, RawReading};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the raw readings table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RawParkingRow {
    pub timestamp: DateTime<Utc>,
    pub parking_id: Option<String>,
    pub name: Option<String>,
    pub free: Option<i64>,
    pub total: Option<i64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl From<&RawReading> for RawParkingRow {
    fn from(reading: &RawReading) -> Self {
        Self {
            timestamp: reading.observed_at,
            parking_id: reading.facility_id.clone(),
            name: reading.name.clone(),
            free: reading.free_spaces,
            total: reading.total_spaces,
            lat: reading.latitude,
            lon: reading.longitude,
        }
    }
}

/// One hour bucket of the free-spaces aggregate
#[derive(Debug, Clone, FromRow)]
pub struct HourlyTotalRow {
    pub hour: DateTime<Utc>,
    pub total_free: i64,
}

impl From<HourlyTotalRow> for HourlyTotal {
    fn from(row: HourlyTotalRow) -> Self {
        Self {
            hour: row.hour,
            total_free: row.total_free,
        }
    }
}

/// Row of the metrics table, one per training run
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ModelMetricsRow {
    pub run_at: DateTime<Utc>,
    pub train_points: i64,
    pub mae: Option<f64>,
    pub model_desc: String,
}

impl From<&ForecastResult> for ModelMetricsRow {
    /// An undefined MAE is stored as NULL
    fn from(result: &ForecastResult) -> Self {
        Self {
            run_at: result.run_at,
            train_points: i64::try_from(result.train_points).unwrap_or(i64::MAX),
            mae: result.mae.is_finite().then_some(result.mae),
            model_desc: result.model_desc.clone(),
        }
    }
}

/// Row of the predictions table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PredictionRow {
    pub created_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
    pub yhat: Option<f64>,
}

impl PredictionRow {
    /// One row per forecast point, all stamped with the run time
    pub fn from_result(result: &ForecastResult) -> Vec<Self> {
        result
            .forecast_points
            .iter()
            .map(|point| Self {
                created_at: result.run_at,
                timestamp: point.at,
                yhat: point.value,
            })
            .collect()
    }
}

/// Default table names
pub mod tables {
    pub const RAW: &str = "raw_parking";
    pub const METRICS: &str = "model_metrics";
    pub const PREDICTIONS: &str = "predictions";
}

/// Postgres truncates identifiers past this many bytes
const MAX_IDENTIFIER_LEN: usize = 63;

/// Lowercase `raw` and replace anything outside `[a-z0-9_]` with `_`.
///
/// A leading digit gets an `_` prefix. Empty input is rejected.
pub fn sanitize_identifier(raw: &str) -> DbResult<String> {
    let mut ident: String = raw
        .trim()
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if ident.is_empty() {
        return Err(DbError::ConfigError(format!(
            "identifier {raw:?} is empty"
        )));
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident.truncate(MAX_IDENTIFIER_LEN);
    Ok(ident)
}

/// Fully qualified names of the warehouse tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseTables {
    schema: String,
    raw: String,
    metrics: String,
    predictions: String,
}

impl WarehouseTables {
    /// Schema `<project>_<dataset>` with the default table names
    pub fn new(project: &str, dataset: &str) -> DbResult<Self> {
        Ok(Self {
            schema: sanitize_identifier(&format!("{project}_{dataset}"))?,
            raw: tables::RAW.to_string(),
            metrics: tables::METRICS.to_string(),
            predictions: tables::PREDICTIONS.to_string(),
        })
    }

    pub fn with_names(mut self, raw: &str, metrics: &str, predictions: &str) -> DbResult<Self> {
        self.raw = sanitize_identifier(raw)?;
        self.metrics = sanitize_identifier(metrics)?;
        self.predictions = sanitize_identifier(predictions)?;
        Ok(self)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn raw(&self) -> String {
        self.qualify(&self.raw)
    }

    pub fn metrics(&self) -> String {
        self.qualify(&self.metrics)
    }

    pub fn predictions(&self) -> String {
        self.qualify(&self.predictions)
    }

    fn qualify(&self, table: &str) -> String {
        format!("\"{}\".\"{}\"", self.schema, table)
    }

    /// Statements creating the schema and every table if missing
    pub fn ddl(&self) -> Vec<String> {
        vec![
            format!("CREATE SCHEMA IF NOT EXISTS \"{}\"", self.schema),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    \"timestamp\" TIMESTAMPTZ NOT NULL,
                    parking_id TEXT,
                    name TEXT,
                    free BIGINT,
                    total BIGINT,
                    lat DOUBLE PRECISION,
                    lon DOUBLE PRECISION
                )",
                self.raw()
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    run_at TIMESTAMPTZ NOT NULL,
                    train_points BIGINT NOT NULL,
                    mae DOUBLE PRECISION,
                    model_desc TEXT NOT NULL
                )",
                self.metrics()
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    created_at TIMESTAMPTZ NOT NULL,
                    \"timestamp\" TIMESTAMPTZ NOT NULL,
                    yhat DOUBLE PRECISION
                )",
                self.predictions()
            ),
        ]
    }
}
