//! Hour buckets for summing the free-spaces signal

use parkcast_core::{truncate_to_hour, Accumulator, AggregateType, RawReading, Timestamp};
use std::collections::BTreeMap;

/// Sums values per hour bucket, ordered by hour
#[derive(Debug, Default)]
pub struct HourBuckets {
    buckets: BTreeMap<Timestamp, Accumulator>,
}

impl HourBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to the bucket containing `at`
    pub fn add(&mut self, at: Timestamp, value: f64) {
        self.buckets
            .entry(truncate_to_hour(at))
            .or_insert_with(|| Accumulator::new(AggregateType::Sum))
            .add(value);
    }

    /// Add a reading's free spaces; readings without a count are skipped
    ///
    /// Returns whether the reading contributed.
    pub fn add_reading(&mut self, reading: &RawReading) -> bool {
        match reading.free_spaces {
            Some(free) => {
                self.add(reading.observed_at, free as f64);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// (hour, sum) pairs in ascending hour order
    pub fn totals(&self) -> Vec<(Timestamp, f64)> {
        self.buckets
            .iter()
            .filter_map(|(hour, acc)| acc.result().map(|sum| (*hour, sum)))
            .collect()
    }
}
