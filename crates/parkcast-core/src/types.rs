//! Core data types for parking readings and forecasts

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// UTC instant, second precision for everything persisted
pub type Timestamp = DateTime<Utc>;

/// One observation of one parking facility at one instant.
///
/// The serde names are the column names of the staged CSV and the raw
/// warehouse table: `timestamp,parking_id,name,free,total,lat,lon`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawReading {
    #[serde(rename = "timestamp", with = "rfc3339_seconds")]
    pub observed_at: Timestamp,

    #[serde(rename = "parking_id")]
    pub facility_id: Option<String>,

    pub name: Option<String>,

    #[serde(rename = "free")]
    pub free_spaces: Option<i64>,

    #[serde(rename = "total")]
    pub total_spaces: Option<i64>,

    #[serde(rename = "lat")]
    pub latitude: Option<f64>,

    #[serde(rename = "lon")]
    pub longitude: Option<f64>,
}

impl RawReading {
    /// A reading at `observed_at` with every field unset
    pub fn empty(observed_at: Timestamp) -> Self {
        Self {
            observed_at,
            facility_id: None,
            name: None,
            free_spaces: None,
            total_spaces: None,
            latitude: None,
            longitude: None,
        }
    }

    /// True when no field besides the timestamp carries a value
    pub fn is_empty(&self) -> bool {
        self.facility_id.is_none()
            && self.name.is_none()
            && self.free_spaces.is_none()
            && self.total_spaces.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}

/// Summed free spaces for one hour bucket, as returned by the warehouse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyTotal {
    pub hour: Timestamp,
    pub total_free: i64,
}

/// A contiguous hourly series with forward-filled gaps.
///
/// `observed[i]` records whether hour `i` came from data or from the
/// fill policy, so callers can count effective points.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    start: Timestamp,
    values: Vec<f64>,
    observed: Vec<bool>,
}

impl HourlySeries {
    pub fn from_parts(
        start: Timestamp,
        values: Vec<f64>,
        observed: Vec<bool>,
    ) -> Result<Self, CoreError> {
        if values.is_empty() {
            return Err(CoreError::EmptySeries);
        }
        if values.len() != observed.len() {
            return Err(CoreError::LengthMismatch {
                values: values.len(),
                observed: observed.len(),
            });
        }
        if start.minute() != 0 || start.second() != 0 || start.nanosecond() != 0 {
            return Err(CoreError::MisalignedStart(start));
        }
        Ok(Self {
            start,
            values,
            observed,
        })
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// Last hour in the series (inclusive)
    pub fn end(&self) -> Timestamp {
        self.timestamp_at(self.values.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn observed(&self) -> &[bool] {
        &self.observed
    }

    /// Number of hours backed by real observations
    pub fn effective_points(&self) -> usize {
        self.observed.iter().filter(|o| **o).count()
    }

    pub fn timestamp_at(&self, index: usize) -> Timestamp {
        self.start + Duration::hours(index as i64)
    }

    /// (hour, value, observed) triples in order
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, f64, bool)> + '_ {
        self.values
            .iter()
            .zip(self.observed.iter())
            .enumerate()
            .map(|(i, (v, o))| (self.timestamp_at(i), *v, *o))
    }

    /// The `steps` hours following the end of the series
    pub fn future_timestamps(&self, steps: usize) -> Vec<Timestamp> {
        let end = self.end();
        (1..=steps)
            .map(|h| end + Duration::hours(h as i64))
            .collect()
    }
}

/// One forecast point; `None` when the model produced no finite value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(with = "rfc3339_seconds")]
    pub at: Timestamp,
    pub value: Option<f64>,
}

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    #[serde(with = "rfc3339_seconds")]
    pub run_at: Timestamp,
    pub model_desc: String,
    /// Mean absolute error on the held-out tail; NaN when undefined
    pub mae: f64,
    pub train_points: usize,
    pub forecast_points: Vec<ForecastPoint>,
}

/// Format a timestamp as `2024-01-01T00:00:00Z`
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Drop sub-second precision
pub fn truncate_to_second(ts: Timestamp) -> Timestamp {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Serde adapter writing timestamps with second precision and a `Z` suffix
pub mod rfc3339_seconds {
    use super::{format_timestamp, Timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
