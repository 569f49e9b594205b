//! Builds the contiguous hourly series the forecaster trains on

use crate::{HourBuckets, SeriesError, SeriesResult};
use chrono::{Duration, Utc};
use parkcast_core::{truncate_to_hour, HourlySeries, HourlyTotal, RawReading, Timestamp};
use tracing::{debug, info};

/// Builder for an [`HourlySeries`] over an optional trailing window
#[derive(Debug, Clone, Default)]
pub struct SeriesBuilder {
    lookback: Option<Duration>,
    as_of: Option<Timestamp>,
}

impl SeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep readings newer than `as_of - lookback`
    pub fn lookback(mut self, lookback: Duration) -> Self {
        self.lookback = Some(lookback);
        self
    }

    /// Reference instant for the lookback window (default: now)
    pub fn as_of(mut self, as_of: Timestamp) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Earliest instant admitted by the window, if one is configured
    pub fn cutoff(&self) -> Option<Timestamp> {
        let lookback = self.lookback?;
        Some(self.as_of.unwrap_or_else(Utc::now) - lookback)
    }

    /// Build from raw readings, summing free spaces per hour
    pub fn build(&self, rows: &[RawReading]) -> SeriesResult<HourlySeries> {
        let cutoff = self.cutoff();
        let mut buckets = HourBuckets::new();
        let used = rows
            .iter()
            .filter(|r| cutoff.map_or(true, |c| r.observed_at >= c))
            .filter(|r| buckets.add_reading(r))
            .count();
        debug!(rows = rows.len(), used, hours = buckets.len(), "bucketed readings");
        regularize(&buckets.totals())
    }

    /// Build from totals already summed per hour by the warehouse.
    ///
    /// The warehouse applies the cutoff to rows, so the hour containing it
    /// holds only admitted readings and is kept.
    pub fn build_from_totals(&self, totals: &[HourlyTotal]) -> SeriesResult<HourlySeries> {
        let first_hour = self.cutoff().map(truncate_to_hour);
        let mut buckets = HourBuckets::new();
        for total in totals
            .iter()
            .filter(|t| first_hour.map_or(true, |h| t.hour >= h))
        {
            buckets.add(total.hour, total.total_free as f64);
        }
        regularize(&buckets.totals())
    }
}

/// Reindex ascending (hour, value) pairs onto a contiguous hourly grid,
/// carrying the last observed value forward over gaps.
pub fn regularize(points: &[(Timestamp, f64)]) -> SeriesResult<HourlySeries> {
    let (Some(&(start, _)), Some(&(end, _))) = (points.first(), points.last()) else {
        return Err(SeriesError::EmptySeries);
    };
    check_hourly(points)?;

    let hours = ((end - start).num_hours() + 1) as usize;
    let mut values = Vec::with_capacity(hours);
    let mut observed = Vec::with_capacity(hours);
    let mut pending = points.iter().peekable();
    let mut last = f64::NAN;

    for i in 0..hours {
        let hour = start + Duration::hours(i as i64);
        match pending.next_if(|(h, _)| *h == hour) {
            Some(&(_, value)) => {
                last = value;
                observed.push(true);
            }
            None => observed.push(false),
        }
        values.push(last);
    }

    let series = HourlySeries::from_parts(start, values, observed)?;
    info!(
        start = %series.start(),
        end = %series.end(),
        hours = series.len(),
        effective = series.effective_points(),
        "built hourly series"
    );
    Ok(series)
}

fn check_hourly(points: &[(Timestamp, f64)]) -> SeriesResult<()> {
    if let Some(&(hour, _)) = points.iter().find(|(h, _)| truncate_to_hour(*h) != *h) {
        return Err(SeriesError::OffHour(hour));
    }
    match points.windows(2).find(|pair| pair[1].0 <= pair[0].0) {
        Some(pair) => Err(SeriesError::Unordered {
            previous: pair[0].0,
            hour: pair[1].0,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap()
    }

    fn reading(ts: Timestamp, id: &str, free: i64) -> RawReading {
        RawReading {
            facility_id: Some(id.to_string()),
            free_spaces: Some(free),
            ..RawReading::empty(ts)
        }
    }

    #[test]
    fn test_forward_fill_over_gap() {
        let rows = vec![
            reading(at(1, 0, 0), "a", 100),
            reading(at(1, 0, 0), "b", 50),
            reading(at(1, 3, 0), "a", 80),
        ];
        let series = SeriesBuilder::new().build(&rows).unwrap();

        assert_eq!(series.len(), 4);
        assert_eq!(series.start(), at(1, 0, 0));
        assert_eq!(series.values(), &[150.0, 150.0, 150.0, 80.0]);
        assert_eq!(series.observed(), &[true, false, false, true]);
        assert_eq!(series.effective_points(), 2);
    }

    #[test]
    fn test_unordered_input_within_hours() {
        let rows = vec![
            reading(at(1, 2, 45), "a", 1),
            reading(at(1, 1, 10), "a", 2),
            reading(at(1, 2, 5), "b", 3),
        ];
        let series = SeriesBuilder::new().build(&rows).unwrap();
        assert_eq!(series.values(), &[2.0, 4.0]);
    }

    #[test]
    fn test_lookback_window_filters() {
        let rows = vec![
            reading(at(1, 0, 0), "a", 999),
            reading(at(8, 12, 0), "a", 10),
            reading(at(9, 11, 30), "a", 20),
        ];
        let series = SeriesBuilder::new()
            .lookback(Duration::days(7))
            .as_of(at(9, 12, 0))
            .build(&rows)
            .unwrap();

        assert_eq!(series.start(), at(8, 12, 0));
        assert_eq!(series.len(), 24);
        assert_eq!(series.values()[0], 10.0);
        assert_eq!(series.values()[23], 20.0);
    }

    #[test]
    fn test_empty_is_error() {
        assert_eq!(
            SeriesBuilder::new().build(&[]),
            Err(SeriesError::EmptySeries)
        );

        let no_counts = vec![RawReading::empty(at(1, 0, 0))];
        assert_eq!(
            SeriesBuilder::new().build(&no_counts),
            Err(SeriesError::EmptySeries)
        );

        let stale = vec![reading(at(1, 0, 0), "a", 5)];
        assert_eq!(
            SeriesBuilder::new()
                .lookback(Duration::days(1))
                .as_of(at(5, 0, 0))
                .build(&stale),
            Err(SeriesError::EmptySeries)
        );
    }

    #[test]
    fn test_from_hourly_totals() {
        let totals = vec![
            HourlyTotal {
                hour: at(1, 0, 0),
                total_free: 300,
            },
            HourlyTotal {
                hour: at(1, 2, 0),
                total_free: 250,
            },
        ];
        let series = SeriesBuilder::new().build_from_totals(&totals).unwrap();
        assert_eq!(series.values(), &[300.0, 300.0, 250.0]);
        assert_eq!(series.effective_points(), 2);
    }

    #[test]
    fn test_regularize_rejects_bad_input() {
        assert_eq!(
            regularize(&[(at(1, 3, 0), 1.0), (at(1, 0, 0), 2.0)]),
            Err(SeriesError::Unordered {
                previous: at(1, 3, 0),
                hour: at(1, 0, 0),
            })
        );
        assert_eq!(
            regularize(&[(at(1, 0, 0), 1.0), (at(1, 0, 0), 2.0)]),
            Err(SeriesError::Unordered {
                previous: at(1, 0, 0),
                hour: at(1, 0, 0),
            })
        );
        assert_eq!(
            regularize(&[(at(1, 0, 0), 1.0), (at(1, 1, 30), 2.0)]),
            Err(SeriesError::OffHour(at(1, 1, 30)))
        );
    }

    #[test]
    fn test_totals_keep_hour_containing_cutoff() {
        let totals = vec![
            HourlyTotal {
                hour: at(1, 9, 0),
                total_free: 1,
            },
            HourlyTotal {
                hour: at(1, 10, 0),
                total_free: 40,
            },
            HourlyTotal {
                hour: at(1, 11, 0),
                total_free: 50,
            },
        ];
        let series = SeriesBuilder::new()
            .lookback(Duration::hours(2))
            .as_of(at(1, 12, 30))
            .build_from_totals(&totals)
            .unwrap();
        assert_eq!(series.start(), at(1, 10, 0));
        assert_eq!(series.values(), &[40.0, 50.0]);
    }

    #[test]
    fn test_single_point_series() {
        let series = regularize(&[(at(1, 5, 0), 42.0)]).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.end(), at(1, 5, 0));
    }
}
