//! Hour bucketing and the accumulators used to roll readings up

use chrono::DateTime;

use crate::types::Timestamp;

/// Aggregation applied by an [`Accumulator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateType {
    Sum,
    Avg,
}

/// Accumulator for calculating aggregates over multiple observations
#[derive(Debug, Clone)]
pub struct Accumulator {
    sum: f64,
    count: usize,
    aggregate_type: AggregateType,
}

impl Accumulator {
    pub fn new(aggregate_type: AggregateType) -> Self {
        Self {
            sum: 0.0,
            count: 0,
            aggregate_type,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn result(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }

        Some(match self.aggregate_type {
            AggregateType::Sum => self.sum,
            AggregateType::Avg => self.sum / self.count as f64,
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Truncate a timestamp to the start of its hour bucket
pub fn truncate_to_hour(ts: Timestamp) -> Timestamp {
    let secs = ts.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(3600), 0).unwrap_or(ts)
}
